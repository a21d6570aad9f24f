//! Field visibility toggling for forms with a selector.
//!
//! A selector input decides which group of dependent fields applies. Every
//! dependent field is declared with the category it belongs to; a field is
//! shown and enabled exactly when its category equals the current selection,
//! and hidden and disabled otherwise. State is a pure function of the current
//! selection, recomputed on construction and on every change.

use serde::Serialize;

/// A dependent field and the category that makes it apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentField<C> {
    pub id: String,
    pub category: C,
}

impl<C> DependentField<C> {
    pub fn new(id: impl Into<String>, category: C) -> Self {
        Self {
            id: id.into(),
            category,
        }
    }
}

/// Rendered state of one dependent field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldState<C> {
    pub id: String,
    pub category: C,
    pub hidden: bool,
    pub disabled: bool,
}

impl<C> FieldState<C> {
    pub fn is_active(&self) -> bool {
        !self.hidden && !self.disabled
    }
}

/// Selector plus the fields that depend on it
#[derive(Debug, Clone)]
pub struct FieldToggler<C> {
    selection: Option<C>,
    fields: Vec<FieldState<C>>,
}

impl<C: PartialEq + Clone> FieldToggler<C> {
    /// Binds the fields and applies the initial selection right away
    pub fn new(selection: Option<C>, fields: impl IntoIterator<Item = DependentField<C>>) -> Self {
        let fields = fields
            .into_iter()
            .map(|f| FieldState {
                id: f.id,
                category: f.category,
                hidden: true,
                disabled: true,
            })
            .collect();

        let mut toggler = Self { selection, fields };
        toggler.recompute();
        toggler
    }

    /// Changes the selection and recomputes every field
    pub fn select(&mut self, selection: Option<C>) {
        self.selection = selection;
        self.recompute();
    }

    pub fn recompute(&mut self) {
        for field in &mut self.fields {
            let inactive = self.selection.as_ref() != Some(&field.category);
            field.disabled = inactive;
            field.hidden = inactive;
        }
    }

    pub fn selection(&self) -> Option<&C> {
        self.selection.as_ref()
    }

    pub fn fields(&self) -> &[FieldState<C>] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldState<C>> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields currently shown and enabled
    pub fn active(&self) -> impl Iterator<Item = &FieldState<C>> {
        self.fields.iter().filter(|f| f.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_and_bank(selection: Option<&'static str>) -> FieldToggler<&'static str> {
        FieldToggler::new(
            selection,
            [
                DependentField::new("card_number", "card"),
                DependentField::new("routing_number", "bank"),
            ],
        )
    }

    #[test]
    fn test_initial_selection_is_applied() {
        let toggler = card_and_bank(Some("card"));

        let card = toggler.field("card_number").unwrap();
        assert!(!card.hidden);
        assert!(!card.disabled);

        let bank = toggler.field("routing_number").unwrap();
        assert!(bank.hidden);
        assert!(bank.disabled);
    }

    #[test]
    fn test_changing_selection_flips_state() {
        let mut toggler = card_and_bank(Some("card"));
        toggler.select(Some("bank"));

        assert!(toggler.field("card_number").unwrap().hidden);
        assert!(toggler.field("card_number").unwrap().disabled);
        assert!(toggler.field("routing_number").unwrap().is_active());

        // Same result as starting from "bank"
        assert_eq!(toggler.fields(), card_and_bank(Some("bank")).fields());
    }

    #[test]
    fn test_empty_selection_hides_everything() {
        let toggler = card_and_bank(None);
        assert_eq!(toggler.active().count(), 0);
        assert!(toggler.fields().iter().all(|f| f.hidden && f.disabled));

        let toggler = card_and_bank(Some(""));
        assert_eq!(toggler.active().count(), 0);
    }

    #[test]
    fn test_several_fields_per_category() {
        let toggler = FieldToggler::new(
            Some("bank"),
            [
                DependentField::new("routing_number", "bank"),
                DependentField::new("account_number", "bank"),
                DependentField::new("card_number", "card"),
            ],
        );
        let active: Vec<&str> = toggler.active().map(|f| f.id.as_str()).collect();
        assert_eq!(active, vec!["routing_number", "account_number"]);
    }
}
