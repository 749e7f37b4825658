use crate::categories::CategoryStore;
use crate::custom_fields::CustomField;
use crate::keys::MainKey;
use serde::Deserialize;

/// Main category whose calls also carry the business contact fields.
pub const BUSINESS_CATEGORY: &str = "kayttotuki";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerFields {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub bpn: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BusinessFields {
    pub business_id: String,
    pub company_name: String,
    pub contact2_name: String,
    pub contact2_phone: String,
    pub contact2_email: String,
    pub ticket_number1: String,
    pub ticket_number2: String,
    pub id1: String,
    pub id2: String,
}

impl BusinessFields {
    fn values(&self) -> [&str; 9] {
        [
            &self.business_id,
            &self.company_name,
            &self.contact2_name,
            &self.contact2_phone,
            &self.contact2_email,
            &self.ticket_number1,
            &self.ticket_number2,
            &self.id1,
            &self.id2,
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SummaryInput {
    pub main_key: String,
    pub subcategory: String,
    pub customer: CustomerFields,
    pub business: BusinessFields,
    /// Values aligned with the custom field list.
    pub custom_values: Vec<String>,
    pub inbound_minutes: u64,
    pub outbound_minutes: u64,
}

/// Builds the copyable call summary, or `None` while the form is empty.
pub fn compose(
    categories: &CategoryStore,
    custom_fields: &[CustomField],
    input: &SummaryInput,
) -> Option<String> {
    let main_key = MainKey::from(input.main_key.trim());
    let subcategory = input.subcategory.trim();
    let customer = &input.customer;

    let nothing_entered = main_key.is_empty()
        && subcategory.is_empty()
        && [
            &customer.first_name,
            &customer.last_name,
            &customer.phone_number,
            &customer.email,
            &customer.bpn,
        ]
        .iter()
        .all(|value| value.is_empty());
    if nothing_entered {
        return None;
    }

    let mut lines = vec!["Summary:".to_string()];

    let full_name = format!("{} {}", customer.first_name, customer.last_name);
    if !full_name.trim().is_empty() {
        lines.push(full_name.trim().to_string());
    }
    for value in [&customer.phone_number, &customer.email, &customer.bpn] {
        if !value.is_empty() {
            lines.push(value.clone());
        }
    }

    for value in input.custom_values.iter().take(custom_fields.len()) {
        if !value.trim().is_empty() {
            lines.push(value.trim().to_string());
        }
    }

    if main_key.as_str() == BUSINESS_CATEGORY {
        lines.extend(
            input
                .business
                .values()
                .into_iter()
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        );
    }

    let category = categories.get(&main_key);
    if let (Some(category), false) = (category, subcategory.is_empty()) {
        lines.push(format!("{} - {}", category.name, subcategory));
    }

    if input.inbound_minutes > 0 {
        lines.push(format!("Inbound: {} min", input.inbound_minutes));
    }
    if input.outbound_minutes > 0 {
        lines.push(format!("Outbound: {} min", input.outbound_minutes));
    }

    let template = categories
        .resolve_subcategory(&main_key, subcategory)
        .and_then(|sub| categories.subcategory(&main_key, &sub))
        .map(|sub| sub.template.as_str())
        .filter(|template| !template.is_empty());
    if let Some(template) = template {
        lines.push(template.to_string());
    }

    let mut summary = lines.join("\n");
    summary.push('\n');
    Some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn categories() -> CategoryStore {
        let (mut store, _) = CategoryStore::load(Arc::new(MemoryStore::new())).unwrap();
        store
            .add_subcategory(&"kayttotuki".into(), "Password reset", "Reset done via portal.")
            .unwrap();
        store
    }

    #[test]
    fn empty_form_has_no_summary() {
        assert_eq!(compose(&categories(), &[], &SummaryInput::default()), None);
    }

    #[test]
    fn summary_lists_fields_in_order() {
        let fields = vec![CustomField { name: "Order".into() }];
        let input = SummaryInput {
            main_key: "kayttotuki".into(),
            subcategory: "password reset".into(),
            customer: CustomerFields {
                first_name: "Aino".into(),
                last_name: "Virtanen".into(),
                phone_number: "040 123".into(),
                ..Default::default()
            },
            business: BusinessFields {
                company_name: "Oy Ab".into(),
                ..Default::default()
            },
            custom_values: vec!["ORD-7".into()],
            inbound_minutes: 5,
            outbound_minutes: 0,
        };

        let summary = compose(&categories(), &fields, &input).unwrap();
        assert_eq!(
            summary,
            "Summary:\nAino Virtanen\n040 123\nORD-7\nOy Ab\n\
             Käyttötuki - password reset\nInbound: 5 min\nReset done via portal.\n"
        );
    }

    #[test]
    fn business_fields_only_for_the_business_category() {
        let input = SummaryInput {
            main_key: "aspa".into(),
            subcategory: "Lasku".into(),
            business: BusinessFields {
                company_name: "Oy Ab".into(),
                ..Default::default()
            },
            outbound_minutes: 2,
            ..Default::default()
        };
        let summary = compose(&categories(), &[], &input).unwrap();
        assert_eq!(summary, "Summary:\nAspa - Lasku\nOutbound: 2 min\n");
    }
}
