//! Command structs for engine operations.
//!
//! These types group parameters for write operations (enrollment, recharge,
//! bonus, consume), keeping call sites readable and avoiding long argument
//! lists.

use uuid::Uuid;

/// Enroll a new member, optionally with initial funding and type grants.
#[derive(Clone, Debug)]
pub struct EnrollMemberCmd {
    pub name: String,
    pub phone: String,
    pub initial_stored_minor: i64,
    pub initial_bonus_minor: i64,
    /// Membership types granted at enrollment.
    pub initial_type_ids: Vec<Uuid>,
}

impl EnrollMemberCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            initial_stored_minor: 0,
            initial_bonus_minor: 0,
            initial_type_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn initial_stored_minor(mut self, amount_minor: i64) -> Self {
        self.initial_stored_minor = amount_minor;
        self
    }

    #[must_use]
    pub fn initial_bonus_minor(mut self, amount_minor: i64) -> Self {
        self.initial_bonus_minor = amount_minor;
        self
    }

    #[must_use]
    pub fn grant_type(mut self, type_id: Uuid) -> Self {
        self.initial_type_ids.push(type_id);
        self
    }
}

/// Recharge stored value, or top up a count card when `membership_type_id`
/// names a count-based type (the amount is then a unit count, not cents).
#[derive(Clone, Debug)]
pub struct RechargeCmd {
    pub member_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub membership_type_id: Option<Uuid>,
}

impl RechargeCmd {
    #[must_use]
    pub fn new(member_id: Uuid, amount_minor: i64) -> Self {
        Self {
            member_id,
            amount_minor,
            description: None,
            membership_type_id: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn membership_type_id(mut self, type_id: Uuid) -> Self {
        self.membership_type_id = Some(type_id);
        self
    }
}

/// Grant promotional (non-withdrawable) balance.
#[derive(Clone, Debug)]
pub struct BonusCmd {
    pub member_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
}

impl BonusCmd {
    #[must_use]
    pub fn new(member_id: Uuid, amount_minor: i64) -> Self {
        Self {
            member_id,
            amount_minor,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Consume against balances, or draw one use from a count card when
/// `membership_type_id` names a count-based type.
#[derive(Clone, Debug)]
pub struct ConsumeCmd {
    pub member_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub membership_type_id: Option<Uuid>,
}

impl ConsumeCmd {
    #[must_use]
    pub fn new(member_id: Uuid, amount_minor: i64) -> Self {
        Self {
            member_id,
            amount_minor,
            description: None,
            membership_type_id: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn membership_type_id(mut self, type_id: Uuid) -> Self {
        self.membership_type_id = Some(type_id);
        self
    }
}
