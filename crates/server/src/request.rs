//! Handling of client subscription requests

use livedata_core::{
    LiveDataSpecification, SubscriptionRequest, SubscriptionResponse, SubscriptionResponseMsg,
    SubscriptionResult, SubscriptionType,
};

use crate::server::StandardLiveDataServer;

impl StandardLiveDataServer {
    /// Resolve, entitlement-check and route a client request.
    ///
    /// Never fails: every problem becomes a per-item response, in request
    /// order.
    pub async fn subscription_request_made(
        &self,
        request: &SubscriptionRequest,
    ) -> SubscriptionResponseMsg {
        log::info!(
            "Received {} request from {} for {} specifications",
            request.subscription_type.as_str(),
            request.user,
            request.specifications.len()
        );
        let specs = &request.specifications;
        let mut responses: Vec<Option<SubscriptionResponse>> = vec![None; specs.len()];

        let resolved = match self.resolver.resolve(specs) {
            Ok(resolved) => resolved,
            Err(e) => {
                log::error!("Failed to resolve subscription request: {}", e);
                return SubscriptionResponseMsg::new(
                    request.user.clone(),
                    internal_errors(specs, &e.to_string()),
                );
            }
        };

        let mut distributable: Vec<usize> = Vec::with_capacity(specs.len());
        for (idx, spec) in specs.iter().enumerate() {
            if resolved.contains_key(spec) {
                distributable.push(idx);
            } else {
                responses[idx] = Some(SubscriptionResponse::error(
                    spec.clone(),
                    SubscriptionResult::NotPresent,
                    format!("Unable to work out distribution spec for specification {}", spec),
                ));
            }
        }

        let candidates: Vec<LiveDataSpecification> =
            distributable.iter().map(|idx| specs[*idx].clone()).collect();
        let entitlements = if candidates.is_empty() {
            Default::default()
        } else {
            match self
                .subscription_entitlement_checker()
                .is_entitled(&request.user, &candidates)
            {
                Ok(entitlements) => entitlements,
                Err(e) => {
                    log::error!("Entitlement check failed for {}: {}", request.user, e);
                    for idx in &distributable {
                        responses[*idx] = Some(SubscriptionResponse::error(
                            specs[*idx].clone(),
                            SubscriptionResult::InternalError,
                            e.to_string(),
                        ));
                    }
                    distributable.clear();
                    Default::default()
                }
            }
        };

        let mut entitled: Vec<usize> = Vec::with_capacity(distributable.len());
        for idx in distributable {
            let spec = &specs[idx];
            if entitlements.get(spec).copied().unwrap_or(false) {
                entitled.push(idx);
            } else {
                log::info!("User {} is not entitled to {}", request.user, spec);
                responses[idx] = Some(SubscriptionResponse::error(
                    spec.clone(),
                    SubscriptionResult::NotAuthorized,
                    format!("User {} is not entitled to {}", request.user, spec),
                ));
            }
        }

        if !entitled.is_empty() {
            let bucket: Vec<LiveDataSpecification> =
                entitled.iter().map(|idx| specs[*idx].clone()).collect();
            let result = match request.subscription_type {
                SubscriptionType::Snapshot => self.snapshot(&bucket).await,
                SubscriptionType::Persistent => self.subscribe(&bucket, true).await,
                SubscriptionType::NonPersistent => self.subscribe(&bucket, false).await,
            };

            match result {
                Ok(bucket_responses) if bucket_responses.len() == entitled.len() => {
                    for (idx, response) in entitled.iter().zip(bucket_responses) {
                        responses[*idx] = Some(response);
                    }
                }
                Ok(bucket_responses) => {
                    log::error!(
                        "Expected {} responses, got {}",
                        entitled.len(),
                        bucket_responses.len()
                    );
                    for idx in &entitled {
                        responses[*idx] = Some(SubscriptionResponse::error(
                            specs[*idx].clone(),
                            SubscriptionResult::InternalError,
                            "Mismatched response count",
                        ));
                    }
                }
                Err(e) => {
                    log::error!("Failed to handle subscription request: {}", e);
                    for idx in &entitled {
                        responses[*idx] = Some(SubscriptionResponse::error(
                            specs[*idx].clone(),
                            SubscriptionResult::InternalError,
                            e.to_string(),
                        ));
                    }
                }
            }
        }

        let responses = responses
            .into_iter()
            .zip(specs)
            .map(|(response, spec)| {
                response.unwrap_or_else(|| {
                    SubscriptionResponse::error(
                        spec.clone(),
                        SubscriptionResult::InternalError,
                        "Request was not handled",
                    )
                })
            })
            .collect();
        SubscriptionResponseMsg::new(request.user.clone(), responses)
    }
}

fn internal_errors(specs: &[LiveDataSpecification], message: &str) -> Vec<SubscriptionResponse> {
    specs
        .iter()
        .map(|spec| {
            SubscriptionResponse::error(spec.clone(), SubscriptionResult::InternalError, message)
        })
        .collect()
}
