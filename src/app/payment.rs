//! Payment screen state: create a payment, show its QR code, wait for the
//! server to confirm it, then unlock "done".

use crate::models::{Payment, PaymentStatus, PremiumPackage};

#[derive(Clone, Debug, PartialEq)]
pub enum PaymentPhase {
    /// Mounted, nothing requested yet
    Idle,
    /// Create-payment call in flight
    Creating,
    /// QR shown, status polling running
    AwaitingPayment,
    /// Server reported `paid = true`; "done" is unlocked
    Confirmed,
    /// User pressed "done"
    Done,
    /// Creation or a status check failed; polling stopped
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct PaymentFlow {
    pub package: Option<PremiumPackage>,
    pub payment: Option<Payment>,
    payment_id: Option<String>,
    pub phase: PaymentPhase,
    /// Request id of the running poll, used to ignore stale responses
    pub poll_id: Option<u64>,
    pub create_id: Option<u64>,
    pub checks: u32,
    pub entitlement_refreshed: bool,
}

impl PaymentFlow {
    /// Mount for a package the user picked
    pub fn for_package(package: PremiumPackage) -> Self {
        PaymentFlow {
            package: Some(package),
            payment: None,
            payment_id: None,
            phase: PaymentPhase::Idle,
            poll_id: None,
            create_id: None,
            checks: 0,
            entitlement_refreshed: false,
        }
    }

    /// Mount for a payment created earlier (e.g. before a restart)
    pub fn resume(payment_id: impl Into<String>) -> Self {
        PaymentFlow {
            package: None,
            payment: None,
            payment_id: Some(payment_id.into()),
            phase: PaymentPhase::AwaitingPayment,
            poll_id: None,
            create_id: None,
            checks: 0,
            entitlement_refreshed: false,
        }
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    pub fn package_id(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.id.as_str())
    }

    pub fn qr_code(&self) -> Option<&str> {
        self.payment.as_ref().and_then(|p| p.qr_code.as_deref())
    }

    /// Creation may start only from a fresh mount or after a failed attempt
    /// that never produced a payment
    pub fn can_create(&self) -> bool {
        self.package.is_some()
            && self.payment_id.is_none()
            && matches!(self.phase, PaymentPhase::Idle | PaymentPhase::Failed(_))
    }

    pub fn begin_create(&mut self, request_id: u64) {
        self.phase = PaymentPhase::Creating;
        self.create_id = Some(request_id);
    }

    pub fn on_created(&mut self, payment: Payment) {
        self.create_id = None;
        self.payment_id = Some(payment.id.clone());
        self.phase = if payment.paid {
            PaymentPhase::Confirmed
        } else {
            PaymentPhase::AwaitingPayment
        };
        self.payment = Some(payment);
    }

    /// Whether a poll should be running for the current state
    pub fn needs_polling(&self) -> bool {
        self.payment_id.is_some() && self.phase == PaymentPhase::AwaitingPayment
    }

    pub fn begin_polling(&mut self, request_id: u64) {
        self.poll_id = Some(request_id);
        self.checks = 0;
    }

    /// Apply one status check. Returns true when this check confirmed the payment.
    pub fn on_status(&mut self, request_id: u64, status: &PaymentStatus) -> bool {
        if self.poll_id != Some(request_id) || self.phase != PaymentPhase::AwaitingPayment {
            return false;
        }
        if let (Some(got), Some(want)) = (status.id.as_deref(), self.payment_id.as_deref()) {
            if got != want {
                return false;
            }
        }

        self.checks += 1;
        if !status.paid {
            return false;
        }

        self.phase = PaymentPhase::Confirmed;
        self.poll_id = None;
        if let Some(payment) = self.payment.as_mut() {
            payment.paid = true;
        }
        true
    }

    pub fn on_poll_failed(&mut self, request_id: u64, message: String) {
        if self.poll_id == Some(request_id) {
            self.poll_id = None;
            self.phase = PaymentPhase::Failed(message);
        }
    }

    pub fn on_create_failed(&mut self, request_id: u64, message: String) -> bool {
        if self.create_id != Some(request_id) {
            return false;
        }
        self.create_id = None;
        self.phase = PaymentPhase::Failed(message);
        true
    }

    /// Put a failed poll back into the waiting state so a remount can poll again
    pub fn remount(&mut self) {
        if self.payment_id.is_some() && matches!(self.phase, PaymentPhase::Failed(_)) {
            self.phase = PaymentPhase::AwaitingPayment;
        }
    }

    pub fn can_finish(&self) -> bool {
        self.phase == PaymentPhase::Confirmed
    }

    pub fn finish(&mut self) -> bool {
        if self.can_finish() {
            self.phase = PaymentPhase::Done;
            true
        } else {
            false
        }
    }

    /// Running poll to cancel when the screen goes away
    pub fn unmount(&mut self) -> Option<u64> {
        self.poll_id.take()
    }
}
