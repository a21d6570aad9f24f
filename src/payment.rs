// ============================================================================
// Order Payment Form
// ============================================================================
//
// The order form has a "pay type" selector and one group of detail fields
// per pay type. FIELDS is the lookup table from field to pay type that the
// toggler evaluates against the current selection.
//
// ============================================================================

use serde::Serialize;
use std::str::FromStr;

use crate::toggler::{DependentField, FieldState, FieldToggler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PayType {
    #[serde(rename = "Check")]
    Check,
    #[serde(rename = "Credit card")]
    CreditCard,
    #[serde(rename = "Purchase order")]
    PurchaseOrder,
}

impl PayType {
    pub const ALL: [PayType; 3] = [PayType::Check, PayType::CreditCard, PayType::PurchaseOrder];

    /// Value submitted by the selector
    pub fn label(self) -> &'static str {
        match self {
            PayType::Check => "Check",
            PayType::CreditCard => "Credit card",
            PayType::PurchaseOrder => "Purchase order",
        }
    }
}

impl FromStr for PayType {
    type Err = UnknownPayType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PayType::ALL
            .into_iter()
            .find(|p| p.label() == s)
            .ok_or_else(|| UnknownPayType(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown pay type: {0:?}")]
pub struct UnknownPayType(pub String);

/// Detail fields of the payment section and the pay type each belongs to
pub const FIELDS: &[(&str, PayType)] = &[
    ("routing_number", PayType::Check),
    ("account_number", PayType::Check),
    ("credit_card_number", PayType::CreditCard),
    ("expiration_date", PayType::CreditCard),
    ("po_number", PayType::PurchaseOrder),
];

/// Payment section of the order form for a given selector value
#[derive(Debug, Clone, Serialize)]
pub struct PaymentForm {
    pub pay_types: Vec<PayType>,
    pub selected: Option<PayType>,
    pub fields: Vec<FieldState<PayType>>,
}

impl PaymentForm {
    /// Empty or unrecognised selections leave every detail field inactive
    pub fn for_selection(selection: Option<&str>) -> Self {
        let selected = selection.and_then(|s| s.parse().ok());
        let toggler = toggler(selected);

        Self {
            pay_types: PayType::ALL.to_vec(),
            selected: toggler.selection().copied(),
            fields: toggler.fields().to_vec(),
        }
    }
}

pub fn toggler(selected: Option<PayType>) -> FieldToggler<PayType> {
    FieldToggler::new(
        selected,
        FIELDS
            .iter()
            .map(|(id, pay_type)| DependentField::new(*id, *pay_type)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_ids(form: &PaymentForm) -> Vec<&str> {
        form.fields
            .iter()
            .filter(|f| f.is_active())
            .map(|f| f.id.as_str())
            .collect()
    }

    #[test]
    fn test_parse_pay_type_labels() {
        assert_eq!("Credit card".parse::<PayType>(), Ok(PayType::CreditCard));
        assert_eq!(
            "credit card".parse::<PayType>(),
            Err(UnknownPayType("credit card".to_string()))
        );
    }

    #[test]
    fn test_credit_card_selection() {
        let form = PaymentForm::for_selection(Some("Credit card"));
        assert_eq!(form.selected, Some(PayType::CreditCard));
        assert_eq!(active_ids(&form), vec!["credit_card_number", "expiration_date"]);
    }

    #[test]
    fn test_unknown_selection_hides_all() {
        let form = PaymentForm::for_selection(Some("Bitcoin"));
        assert_eq!(form.selected, None);
        assert!(active_ids(&form).is_empty());
        assert_eq!(form.fields.len(), FIELDS.len());
    }

    #[test]
    fn test_switching_pay_type() {
        let mut toggler = toggler(Some(PayType::Check));
        toggler.select(Some(PayType::PurchaseOrder));
        let active: Vec<&str> = toggler.active().map(|f| f.id.as_str()).collect();
        assert_eq!(active, vec!["po_number"]);
    }

    #[test]
    fn test_serialized_form_uses_labels() {
        let form = PaymentForm::for_selection(Some("Check"));
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["selected"], "Check");
        assert_eq!(json["fields"][0]["category"], "Check");
        assert_eq!(json["fields"][0]["hidden"], false);
        assert_eq!(json["fields"][4]["disabled"], true);
    }
}
