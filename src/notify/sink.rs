use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::entity::Destination;
use crate::error::NotifyError;
use crate::notify::message::RecoveryMessage;
use crate::notify::{NotificationSink, RecoveryEvent};

/// A rendered attachment (e.g. a profile summary image).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// File name hint for the receiving side.
    pub file_name: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// Delivery channel for recovery notices (chat client, webhook, mailer...).
#[async_trait]
pub trait Courier: Send + Sync + 'static {
    /// Sends a plain text message.
    async fn send_text(&self, destination: &Destination, text: &str) -> Result<(), NotifyError>;

    /// Sends an attachment with `caption`.
    async fn send_attachment(
        &self,
        destination: &Destination,
        attachment: Attachment,
        caption: &str,
    ) -> Result<(), NotifyError>;
}

/// Produces an attachment for a recovery (external renderer).
#[async_trait]
pub trait AttachmentRenderer: Send + Sync + 'static {
    /// Renders the attachment bytes for `event`.
    async fn render(&self, event: &RecoveryEvent) -> Result<Vec<u8>, NotifyError>;
}

/// [`NotificationSink`] delivering through a [`Courier`], with an optional
/// rendered attachment.
///
/// ### Rules
/// - An attachment is attempted only when enabled, a renderer is set and the
///   profile has a picture reference.
/// - Any render or attachment-send failure falls back to the text message.
/// - Only a failing text message is returned as an error.
pub struct CourierSink<C> {
    courier: C,
    renderer: Option<Arc<dyn AttachmentRenderer>>,
    attachments: bool,
}

impl<C: Courier> CourierSink<C> {
    /// Text-only sink.
    pub fn new(courier: C) -> Self {
        Self {
            courier,
            renderer: None,
            attachments: true,
        }
    }

    /// Sets the attachment renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn AttachmentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Enables or disables attachments (`generate_attachments` in the engine config).
    pub fn with_attachments(mut self, enabled: bool) -> Self {
        self.attachments = enabled;
        self
    }

    /// Underlying courier.
    pub fn courier(&self) -> &C {
        &self.courier
    }

    async fn send_rendered(
        &self,
        renderer: &dyn AttachmentRenderer,
        event: &RecoveryEvent,
        message: &RecoveryMessage<'_>,
        text: &str,
    ) -> Result<(), NotifyError> {
        let bytes = renderer.render(event).await?;
        if bytes.is_empty() {
            return Err(NotifyError::Render {
                error: "renderer returned no data".to_string(),
            });
        }
        let attachment = Attachment {
            file_name: message.attachment_name(),
            bytes,
        };
        info!(
            entity = %event.entity,
            bytes = attachment.bytes.len(),
            "sending recovery attachment"
        );
        self.courier
            .send_attachment(&event.destination, attachment, text)
            .await
    }
}

#[async_trait]
impl<C: Courier> NotificationSink for CourierSink<C> {
    async fn notify_recovered(&self, event: &RecoveryEvent) -> Result<(), NotifyError> {
        let message = RecoveryMessage::new(event);
        let text = message.text();

        let renderer = self
            .renderer
            .as_deref()
            .filter(|_| self.attachments && event.attributes.profile_pic_url.is_some());

        if let Some(renderer) = renderer {
            match self.send_rendered(renderer, event, &message, &text).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        entity = %event.entity,
                        error = %e,
                        label = e.as_label(),
                        "attachment failed, falling back to text"
                    );
                }
            }
        }

        self.courier.send_text(&event.destination, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ProfileAttributes;
    use crate::entity::EntityId;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recording {
        texts: Mutex<Vec<String>>,
        attachments: Mutex<Vec<(String, usize)>>,
        fail_attachments: bool,
        fail_text: bool,
    }

    #[async_trait]
    impl Courier for Arc<Recording> {
        async fn send_text(&self, _d: &Destination, text: &str) -> Result<(), NotifyError> {
            if self.fail_text {
                return Err(NotifyError::Delivery {
                    error: "offline".into(),
                });
            }
            self.texts.lock().push(text.to_string());
            Ok(())
        }

        async fn send_attachment(
            &self,
            _d: &Destination,
            attachment: Attachment,
            caption: &str,
        ) -> Result<(), NotifyError> {
            if self.fail_attachments {
                return Err(NotifyError::Delivery {
                    error: "too large".into(),
                });
            }
            self.attachments
                .lock()
                .push((caption.to_string(), attachment.bytes.len()));
            Ok(())
        }
    }

    struct Renderer(Result<Vec<u8>, NotifyError>);

    #[async_trait]
    impl AttachmentRenderer for Renderer {
        async fn render(&self, _event: &RecoveryEvent) -> Result<Vec<u8>, NotifyError> {
            self.0.clone()
        }
    }

    fn event(with_pic: bool) -> RecoveryEvent {
        RecoveryEvent {
            entity: EntityId::parse("foo").unwrap(),
            destination: Destination::from("chat"),
            attributes: ProfileAttributes {
                profile_pic_url: with_pic.then(|| "http://pic".to_string()),
                ..Default::default()
            },
            elapsed: Duration::from_secs(10),
            checks: 1,
        }
    }

    #[tokio::test]
    async fn attachment_when_possible() {
        let rec = Arc::new(Recording::default());
        let sink = CourierSink::new(rec.clone()).with_renderer(Arc::new(Renderer(Ok(vec![1, 2, 3]))));

        sink.notify_recovered(&event(true)).await.unwrap();

        assert_eq!(rec.attachments.lock().len(), 1);
        assert_eq!(rec.attachments.lock()[0].1, 3);
        assert!(rec.texts.lock().is_empty());
    }

    #[tokio::test]
    async fn render_failure_degrades_to_text() {
        let rec = Arc::new(Recording::default());
        let sink = CourierSink::new(rec.clone()).with_renderer(Arc::new(Renderer(Err(
            NotifyError::Render {
                error: "font missing".into(),
            },
        ))));

        sink.notify_recovered(&event(true)).await.unwrap();

        assert!(rec.attachments.lock().is_empty());
        assert_eq!(rec.texts.lock().len(), 1);
    }

    #[tokio::test]
    async fn empty_render_and_send_failure_degrade_to_text() {
        let rec = Arc::new(Recording::default());
        let sink = CourierSink::new(rec.clone()).with_renderer(Arc::new(Renderer(Ok(Vec::new()))));
        sink.notify_recovered(&event(true)).await.unwrap();
        assert_eq!(rec.texts.lock().len(), 1);

        let rec = Arc::new(Recording {
            fail_attachments: true,
            ..Default::default()
        });
        let sink = CourierSink::new(rec.clone()).with_renderer(Arc::new(Renderer(Ok(vec![9]))));
        sink.notify_recovered(&event(true)).await.unwrap();
        assert_eq!(rec.texts.lock().len(), 1);
    }

    #[tokio::test]
    async fn no_picture_or_disabled_sends_text() {
        let rec = Arc::new(Recording::default());
        let sink = CourierSink::new(rec.clone()).with_renderer(Arc::new(Renderer(Ok(vec![1]))));
        sink.notify_recovered(&event(false)).await.unwrap();

        let sink = CourierSink::new(rec.clone())
            .with_renderer(Arc::new(Renderer(Ok(vec![1]))))
            .with_attachments(false);
        sink.notify_recovered(&event(true)).await.unwrap();

        assert_eq!(rec.texts.lock().len(), 2);
        assert!(rec.attachments.lock().is_empty());
    }

    #[tokio::test]
    async fn failing_text_is_reported() {
        let rec = Arc::new(Recording {
            fail_text: true,
            ..Default::default()
        });
        let sink = CourierSink::new(rec);
        let err = sink.notify_recovered(&event(false)).await.unwrap_err();
        assert_eq!(err.as_label(), "notify_delivery");
    }
}
