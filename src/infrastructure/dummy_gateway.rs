//! An in-process gateway for demos and tests.
//!
//! Card numbers must pass the Luhn check. Cards ending in an even digit are
//! approved and the rest are declined. The gateway can also be told to
//! answer with a number of redirects before the final response, which
//! mimics a 3-D Secure style round trip.

use crate::domain::payload::{RequestParameters, ResponseData};
use crate::domain::ports::{Gateway, GatewayAction, GatewayRequest, GatewayResponse};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct DummyGateway {
    redirects: u32,
}

impl DummyGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request answers with `redirects` redirect responses first.
    pub fn with_redirects(mut self, redirects: u32) -> Self {
        self.redirects = redirects;
        self
    }
}

#[async_trait]
impl Gateway for DummyGateway {
    type Request = DummyRequest;

    fn name(&self) -> &str {
        "dummy"
    }

    /// Validates the parameters the way the request would before sending.
    async fn request(
        &self,
        action: &GatewayAction,
        params: RequestParameters,
    ) -> Result<DummyRequest> {
        let amount = params
            .get_str("amount")
            .ok_or_else(|| TransferError::Validation("The amount parameter is required".into()))?
            .to_string();
        let number = params
            .get("card")
            .and_then(|card| card.get("number"))
            .and_then(|number| number.as_str())
            .ok_or_else(|| TransferError::Validation("The card parameter is required".into()))?;
        if !luhn_valid(number) {
            return Err(TransferError::Validation(
                "Card number is invalid".to_string(),
            ));
        }
        let approved = number
            .chars()
            .last()
            .and_then(|digit| digit.to_digit(10))
            .is_some_and(|digit| digit % 2 == 0);

        debug!(%action, amount = %amount, approved, "dummy request prepared");
        Ok(DummyRequest {
            amount,
            approved,
            reference: Uuid::new_v4().simple().to_string(),
            redirects_left: AtomicU32::new(self.redirects),
        })
    }
}

#[derive(Debug)]
pub struct DummyRequest {
    amount: String,
    approved: bool,
    reference: String,
    redirects_left: AtomicU32,
}

#[async_trait]
impl GatewayRequest for DummyRequest {
    type Response = DummyResponse;

    async fn send(&self) -> Result<DummyResponse> {
        let redirected = self
            .redirects_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();

        if redirected {
            return Ok(DummyResponse {
                redirect: true,
                data: ResponseData::new()
                    .with("reference", self.reference.clone())
                    .with("message", "Redirect"),
            });
        }

        let message = if self.approved { "Success" } else { "Failure" };
        Ok(DummyResponse {
            redirect: false,
            data: ResponseData::new()
                .with("amount", self.amount.clone())
                .with("reference", self.reference.clone())
                .with("success", self.approved)
                .with("message", message),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DummyResponse {
    redirect: bool,
    data: ResponseData,
}

impl GatewayResponse for DummyResponse {
    fn is_redirect(&self) -> bool {
        self.redirect
    }

    fn is_successful(&self) -> bool {
        !self.redirect && self.data.get_bool("success").unwrap_or(false)
    }

    fn data(&self) -> ResponseData {
        self.data.clone()
    }
}

fn luhn_valid(number: &str) -> bool {
    let digits: Option<Vec<u32>> = number
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(10))
        .collect();
    let Some(digits) = digits else {
        return false;
    };
    if digits.len() < 12 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(index, &digit)| {
            if index % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}
