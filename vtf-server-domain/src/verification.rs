use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::info;
use moka::ops::compute::{CompResult, Op};
use rand::Rng;

use crate::{ServiceError, ServiceResult, email::ArcEmailService, util::validate_email};

const VERIFICATION_CODE_TTL: Duration = Duration::from_secs(5 * 60);

pub type ArcCodeStore = Arc<Box<dyn CodeStore + Send + Sync + 'static>>;

/// Keeps at most one pending code per email, each with its own expiry.
#[async_trait::async_trait]
pub trait CodeStore {
    async fn put_code(&self, email: &str, code: &str, expires_at: DateTime<Utc>)
    -> ServiceResult<()>;
    /// Removes the code and returns true if it matches and has not expired at `now`.
    async fn take_code(&self, email: &str, code: &str, now: DateTime<Utc>) -> ServiceResult<bool>;
    async fn remove_code(&self, email: &str) -> ServiceResult<()>;
}

/// Process-local code store. Entries are also evicted by moka once the
/// longest possible lifetime has passed.
pub struct MokaCodeStore {
    codes: moka::sync::Cache<String, (String, DateTime<Utc>)>,
}

impl MokaCodeStore {
    pub fn new() -> Self {
        Self {
            codes: moka::sync::Cache::builder()
                .max_capacity(10_000)
                .time_to_live(VERIFICATION_CODE_TTL)
                .build(),
        }
    }
}

impl Default for MokaCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CodeStore for MokaCodeStore {
    async fn put_code(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        self.codes
            .insert(email.to_string(), (code.to_string(), expires_at));
        Ok(())
    }

    async fn take_code(&self, email: &str, code: &str, now: DateTime<Utc>) -> ServiceResult<bool> {
        let result = self
            .codes
            .entry_by_ref(email)
            .and_compute_with(|entry| match entry {
                Some(entry) => {
                    let (expected, expires_at) = entry.value();
                    if expected == code && now < *expires_at {
                        Op::Remove
                    } else {
                        Op::Nop
                    }
                }
                None => Op::Nop,
            });
        Ok(matches!(result, CompResult::Removed(_)))
    }

    async fn remove_code(&self, email: &str) -> ServiceResult<()> {
        self.codes.invalidate(email);
        Ok(())
    }
}

pub type ArcVerificationService = Arc<Box<dyn VerificationService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait VerificationService {
    async fn send_verification_code(&self, email: &str) -> ServiceResult<()>;
    /// Consumes the code on success.
    async fn verify_code(&self, email: &str, code: &str) -> ServiceResult<bool>;
}

pub struct VerificationServiceImpl {
    email_service: ArcEmailService,
    store: ArcCodeStore,
    ttl: chrono::Duration,
}

impl VerificationServiceImpl {
    pub fn new(email_service: ArcEmailService, store: ArcCodeStore) -> Self {
        Self::with_ttl(email_service, store, VERIFICATION_CODE_TTL)
    }

    pub fn with_ttl(email_service: ArcEmailService, store: ArcCodeStore, ttl: Duration) -> Self {
        Self {
            email_service,
            store,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::minutes(5)),
        }
    }

    fn generate_code() -> String {
        rand::rng().random_range(100_000..1_000_000).to_string()
    }

    fn send_code_email(&self, to: &str, code: &str) -> ServiceResult<()> {
        let subject = "[VTF] 이메일 인증 코드";
        let body = format!(
            "안녕하세요, VTF 회원가입을 위한 인증 코드입니다.\n\n\
        인증 코드: {}\n\n\
        이 코드는 {}분 동안만 유효합니다.",
            code,
            self.ttl.num_minutes().max(1)
        );
        self.email_service.send_email(to, subject, &body)
    }
}

#[async_trait::async_trait]
impl VerificationService for VerificationServiceImpl {
    async fn send_verification_code(&self, email: &str) -> ServiceResult<()> {
        let email = validate_email(email)?;
        let code = Self::generate_code();
        self.store
            .put_code(&email, &code, Utc::now() + self.ttl)
            .await?;
        if let Err(e) = self.send_code_email(&email, &code) {
            self.store.remove_code(&email).await?;
            return Err(e);
        }
        info!("Sent verification code to {}", email);
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> ServiceResult<bool> {
        let code = code.trim();
        if code.is_empty() {
            return ServiceError::bad_request("Code must not be empty");
        }
        self.store.take_code(email.trim(), code, Utc::now()).await
    }
}
