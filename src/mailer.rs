//! Outgoing email.
//!
//! Delivery is always best-effort: callers go through [`send_best_effort`],
//! which logs failures and never hands them back to the request.

use crate::config::SmtpConfig;
use crate::models::HotelBooking;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address {0}")]
    Address(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("smtp transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Writes emails to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "email (not delivered, no SMTP configured)"
        );
        tracing::debug!(body = %email.body, "email body");
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: impl Into<String>) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| MailError::Address(self.from.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| MailError::Address(email.to.clone()))?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

pub async fn send_best_effort(mailer: &dyn Mailer, email: Email) {
    let to = email.to.clone();
    let subject = email.subject.clone();
    if let Err(e) = mailer.send(email).await {
        tracing::warn!(%to, %subject, error = %e, "failed to send email");
    }
}

fn booking_summary(booking: &HotelBooking) -> String {
    format!(
        "Hotel: {}\nRoom: {}\nGuests: {}\nCheck-in: {}\nCheck-out: {}\nPhone: {}\n\
         Special requests: {}",
        booking.hotel_name,
        booking.room_type,
        booking.guest_names.join(", "),
        booking.check_in,
        booking.check_out,
        booking.phone,
        booking.special_requests.as_deref().unwrap_or("-"),
    )
}

pub fn booking_received(booking: &HotelBooking) -> Email {
    Email {
        to: booking.email.clone(),
        subject: format!("We received your booking request for {}", booking.hotel_name),
        body: format!(
            "Thank you for your booking request. We will confirm it shortly.\n\n{}",
            booking_summary(booking)
        ),
    }
}

pub fn booking_admin_notice(booking: &HotelBooking, admin: &str) -> Email {
    Email {
        to: admin.to_string(),
        subject: format!("New hotel booking #{} ({})", booking.id, booking.hotel_name),
        body: format!(
            "A new booking is waiting for confirmation.\n\nContact: {}\n{}",
            booking.email,
            booking_summary(booking)
        ),
    }
}

pub fn booking_confirmed(booking: &HotelBooking) -> Email {
    Email {
        to: booking.email.clone(),
        subject: format!("Your booking at {} is confirmed", booking.hotel_name),
        body: format!(
            "Good news, your booking is confirmed. See you at the festival!\n\n{}",
            booking_summary(booking)
        ),
    }
}
