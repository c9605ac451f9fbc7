//! Snapshot flow

use indexmap::IndexMap;
use livedata_core::{
    DistributionSpecification, FieldContainer, FieldHistoryStore,
    LIVE_DATA_PERMISSION_DENIED_FIELD, LiveDataSpecification, LiveDataValueUpdate, RawId,
    SubscriptionResponse, SubscriptionResult,
};

use crate::error::{Error, Result};
use crate::server::StandardLiveDataServer;

impl StandardLiveDataServer {
    /// Snapshot a batch of specifications; one response per input, in input
    /// order.
    ///
    /// A live distributor already holding values answers without an upstream
    /// call. Everything else goes to the provider in a single batch.
    pub async fn snapshot(
        &self,
        specs: &[LiveDataSpecification],
    ) -> Result<Vec<SubscriptionResponse>> {
        self.verify_connection_ok()?;

        let resolved = self.resolver.resolve(specs)?;
        let domain = self.provider.unique_id_domain();

        let mut responses: Vec<Option<SubscriptionResponse>> = vec![None; specs.len()];
        let mut to_fetch: IndexMap<RawId, Vec<(usize, &DistributionSpecification)>> =
            IndexMap::new();

        for (idx, spec) in specs.iter().enumerate() {
            let Some(distribution_spec) = resolved.get(spec) else {
                responses[idx] = Some(SubscriptionResponse::error(
                    spec.clone(),
                    SubscriptionResult::NotPresent,
                    format!("Unable to work out distribution spec for specification {}", spec),
                ));
                continue;
            };
            let fq = distribution_spec.fully_qualified_specification();

            if let Some(distributor) = self.get_market_data_distributor(fq).await {
                if let Some(update) = distributor.snapshot() {
                    responses[idx] = Some(SubscriptionResponse::snapshot(spec.clone(), update));
                    continue;
                }
                if self
                    .provider
                    .empty_subscription_implies_empty_snapshot(&distributor)
                {
                    responses[idx] = Some(SubscriptionResponse::error(
                        spec.clone(),
                        SubscriptionResult::InternalError,
                        format!("Existing subscription for {} failed to return a snapshot", fq),
                    ));
                    continue;
                }
            }

            match fq.identifier(&domain) {
                Some(raw_id) => to_fetch
                    .entry(raw_id.to_string())
                    .or_default()
                    .push((idx, distribution_spec)),
                None => {
                    responses[idx] = Some(SubscriptionResponse::error(
                        spec.clone(),
                        SubscriptionResult::InternalError,
                        format!("Qualified spec {} does not contain ID of domain {}", fq, domain),
                    ));
                }
            }
        }

        if !to_fetch.is_empty() {
            let raw_ids: Vec<RawId> = to_fetch.keys().cloned().collect();
            let snapshots = self.provider.do_snapshot(&raw_ids).await?;

            for (raw_id, items) in &to_fetch {
                let fields = snapshots.get(raw_id);
                for (idx, distribution_spec) in items {
                    let spec = &specs[*idx];
                    responses[*idx] = Some(match fields {
                        Some(fields) => snapshot_response(spec, raw_id, distribution_spec, fields),
                        None => SubscriptionResponse::error(
                            spec.clone(),
                            SubscriptionResult::InternalError,
                            format!("Provider returned no snapshot for {}", raw_id),
                        ),
                    });
                }
            }
        }

        Ok(responses
            .into_iter()
            .zip(specs)
            .map(|(response, spec)| {
                response.unwrap_or_else(|| {
                    SubscriptionResponse::error(
                        spec.clone(),
                        SubscriptionResult::InternalError,
                        "No snapshot produced",
                    )
                })
            })
            .collect())
    }

    /// Ask the provider for a fresh image of one raw id, bypassing any live
    /// distributor
    pub async fn force_snapshot(&self, raw_id: &str) -> Result<FieldContainer> {
        self.verify_connection_ok()?;
        let mut snapshots = self.provider.do_snapshot(&[raw_id.to_string()]).await?;
        snapshots.remove(raw_id).ok_or_else(|| {
            Error::Contract(format!("Provider returned no snapshot for {}", raw_id))
        })
    }
}

fn snapshot_response(
    spec: &LiveDataSpecification,
    raw_id: &str,
    distribution_spec: &DistributionSpecification,
    fields: &FieldContainer,
) -> SubscriptionResponse {
    if fields.has_field(LIVE_DATA_PERMISSION_DENIED_FIELD) {
        let message = fields
            .get_text(LIVE_DATA_PERMISSION_DENIED_FIELD)
            .unwrap_or("Permission denied");
        return SubscriptionResponse::error(spec.clone(), SubscriptionResult::NotAuthorized, message);
    }

    match distribution_spec.normalized_message(fields, raw_id, &FieldHistoryStore::new()) {
        Some(normalized) => SubscriptionResponse::snapshot(
            spec.clone(),
            LiveDataValueUpdate::new(
                0,
                distribution_spec.fully_qualified_specification().clone(),
                normalized,
            ),
        ),
        None => SubscriptionResponse::error(
            spec.clone(),
            SubscriptionResult::InternalError,
            format!(
                "When snapshotting {}, normalization of {} produced no data",
                raw_id,
                distribution_spec.fully_qualified_specification()
            ),
        ),
    }
}
