use async_trait::async_trait;
use lettre::{
    address::AddressError,
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::{config::MailConfig, domain::Email};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid mail address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp submission failed: {0}")]
    Transport(#[from] SmtpError),
}

#[async_trait]
pub trait Notifier {
    async fn send(&self, email: &Email) -> Result<(), DeliveryError>;
}

/// Submits mail over STARTTLS with authenticated login. A single attempt is
/// made per message.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Result<Self, DeliveryError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout))
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &Email) -> Result<(), DeliveryError> {
        let message = build_message(email)?;
        let response = self.transport.send(message).await?;
        tracing::debug!(
            target: "mail",
            code = %response.code(),
            to = %email.to,
            "message accepted by relay"
        );
        Ok(())
    }
}

fn build_message(email: &Email) -> Result<Message, DeliveryError> {
    let parse = |address: &str| {
        address.parse::<Mailbox>().map_err(|source| DeliveryError::Address {
            address: address.to_string(),
            source,
        })
    };

    let message = Message::builder()
        .from(parse(&email.from)?)
        .to(parse(&email.to)?)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())?;
    Ok(message)
}
