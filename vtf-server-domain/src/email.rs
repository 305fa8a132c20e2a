use std::sync::{Arc, Mutex};

use lettre::{
    Address, Message, SmtpTransport, Transport, message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use crate::{ServiceError, ServiceResult};

pub type ArcEmailService = Arc<Box<dyn EmailService + Send + Sync + 'static>>;

pub trait EmailService {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> ServiceResult<()>;
}

/// SMTP relay configured through `VTF_EMAIL_*` environment variables.
pub struct EmailServiceImpl;

impl EmailServiceImpl {
    fn env(name: &str) -> ServiceResult<String> {
        std::env::var(name).map_err(|_| ServiceError::Internal(format!("{} env var not set", name)))
    }
}

impl EmailService for EmailServiceImpl {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> ServiceResult<()> {
        let host = Self::env("VTF_EMAIL_HOST")?;
        let user = Self::env("VTF_EMAIL_USER")?;
        let password = Self::env("VTF_EMAIL_PASSWORD")?;
        let from = Self::env("VTF_EMAIL_FROM")?;

        let from = Address::try_from(from)
            .map_err(|e| ServiceError::Internal(format!("Invalid from address: {}", e)))?;
        let to = Address::try_from(to.to_string())
            .map_err(|e| ServiceError::BadRequest(format!("Invalid to address: {}", e)))?;
        let email = Message::builder()
            .from(Mailbox::new(Some("VTF".to_string()), from))
            .to(Mailbox::new(None, to))
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| ServiceError::Internal(format!("Failed to build email: {}", e)))?;

        let transport = SmtpTransport::relay(&host)
            .map_err(|e| ServiceError::Internal(format!("Failed to create SMTP transport: {}", e)))?
            .credentials(Credentials::new(user, password))
            .build();
        transport
            .send(&email)
            .map_err(|e| ServiceError::Internal(format!("Failed to send email: {}", e)))?;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MockEmailService {
    sent: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl MockEmailService {
    pub fn get_sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl EmailService for MockEmailService {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> ServiceResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}
