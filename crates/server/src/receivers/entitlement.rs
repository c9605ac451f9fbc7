use livedata_gateway::{ChannelResponder, EntitlementRequest, EntitlementResponse};
use livedata_ports::EntitlementChecker;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Answers entitlement queries with an [`EntitlementChecker`].
///
/// A failing checker answers "not entitled" for everything asked.
#[derive(Clone)]
pub struct EntitlementServer {
    checker: Arc<dyn EntitlementChecker>,
}

impl EntitlementServer {
    pub fn new(checker: Arc<dyn EntitlementChecker>) -> Self {
        Self { checker }
    }

    pub fn request_received(&self, request: &EntitlementRequest) -> EntitlementResponse {
        let answers = match self.checker.is_entitled(&request.user, &request.specifications) {
            Ok(answers) => answers,
            Err(e) => {
                log::warn!("Entitlement check failed for {}: {}", request.user, e);
                Default::default()
            }
        };

        EntitlementResponse {
            entitlements: request
                .specifications
                .iter()
                .map(|spec| (spec.clone(), answers.get(spec).copied().unwrap_or(false)))
                .collect(),
        }
    }

    pub fn spawn(
        self,
        mut responder: ChannelResponder<EntitlementRequest, EntitlementResponse>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some((request, reply)) = responder.next().await {
                let response = self.request_received(&request);
                if reply.send(response).is_err() {
                    log::warn!("Entitlement requester from {} went away", request.user);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::UserDenyListEntitlementChecker;
    use livedata_core::{ExternalId, LiveDataSpecification, UserPrincipal};
    use livedata_gateway::{ChannelRequester, Requester};

    #[tokio::test]
    async fn test_entitlement_round_trip_over_channel() {
        let server = EntitlementServer::new(Arc::new(UserDenyListEntitlementChecker::new(["bob"])));
        let (requester, responder) = ChannelRequester::pair(4);
        let handle = server.spawn(responder);

        let spec = LiveDataSpecification::of("R", ExternalId::of("SIM", "FOO"));
        let alice = requester
            .request(&EntitlementRequest::new(
                UserPrincipal::local("alice"),
                vec![spec.clone()],
            ))
            .await
            .unwrap();
        let bob = requester
            .request(&EntitlementRequest::new(
                UserPrincipal::local("bob"),
                vec![spec.clone()],
            ))
            .await
            .unwrap();

        assert_eq!(alice.is_entitled(&spec), Some(true));
        assert_eq!(bob.is_entitled(&spec), Some(false));

        drop(requester);
        handle.await.unwrap();
    }
}
