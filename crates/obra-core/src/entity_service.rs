//! Uniform add/update/delete for the flat reference-entity stores.
//!
//! Deleting an entity that entries, line items or settlements still point at
//! is refused with [`CoreError::ReferenceInUse`]; unknown identifiers are a
//! silent no-op for both update and delete.

use obra_domain::{
    CashAccount, Customer, EntryKind, Identifiable, Ledger, NamedEntity, Product, Project,
    RevenueCategory, Supplier,
};
use tracing::info;

use crate::ids::IdGenerator;
use crate::{CoreError, CoreResult};

/// Describes how a reference entity is stored and referenced in the ledger.
pub trait ReferenceEntity: Identifiable + NamedEntity + Clone {
    const KIND: &'static str;
    const ID_PREFIX: &'static str;

    fn collection(ledger: &Ledger) -> &Vec<Self>;
    fn collection_mut(ledger: &mut Ledger) -> &mut Vec<Self>;
    fn assign_id(&mut self, id: String);

    /// Number of records that still point at `id`.
    fn reference_count(ledger: &Ledger, id: &str) -> usize;
}

pub struct EntityService;

impl EntityService {
    pub fn add<T: ReferenceEntity>(ledger: &mut Ledger, mut draft: T) -> CoreResult<T> {
        Self::validate_name::<T>(draft.name())?;
        let id = IdGenerator::random(T::ID_PREFIX, |candidate| {
            T::collection(ledger)
                .iter()
                .any(|item| item.id() == candidate)
        });
        draft.assign_id(id);
        T::collection_mut(ledger).push(draft.clone());
        ledger.touch();
        info!(kind = T::KIND, id = draft.id(), "entity created");
        Ok(draft)
    }

    /// Replaces the record with the same identifier. Unknown ids are ignored.
    pub fn update<T: ReferenceEntity>(ledger: &mut Ledger, entity: T) -> CoreResult<bool> {
        Self::validate_name::<T>(entity.name())?;
        let Some(slot) = T::collection_mut(ledger)
            .iter_mut()
            .find(|item| item.id() == entity.id())
        else {
            return Ok(false);
        };
        *slot = entity;
        ledger.touch();
        Ok(true)
    }

    /// Removes the record unless something still references it. Unknown ids are ignored.
    pub fn delete<T: ReferenceEntity>(ledger: &mut Ledger, id: &str) -> CoreResult<bool> {
        let Some(position) = T::collection(ledger)
            .iter()
            .position(|item| item.id() == id)
        else {
            return Ok(false);
        };
        let references = T::reference_count(ledger, id);
        if references > 0 {
            return Err(CoreError::ReferenceInUse(format!(
                "{} {} is referenced by {} record(s)",
                T::KIND,
                id,
                references
            )));
        }
        T::collection_mut(ledger).remove(position);
        ledger.touch();
        info!(kind = T::KIND, id, "entity deleted");
        Ok(true)
    }

    pub fn list<T: ReferenceEntity>(ledger: &Ledger) -> Vec<&T> {
        let mut items: Vec<&T> = T::collection(ledger).iter().collect();
        items.sort_by_key(|item| item.name().to_lowercase());
        items
    }

    fn validate_name<T: ReferenceEntity>(name: &str) -> CoreResult<()> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation(format!("{} name cannot be empty", T::KIND)));
        }
        Ok(())
    }
}

fn entries_where(ledger: &Ledger, predicate: impl Fn(&obra_domain::FinancialEntry) -> bool) -> usize {
    ledger.entries.iter().filter(|entry| predicate(entry)).count()
}

impl ReferenceEntity for Project {
    const KIND: &'static str = "Project";
    const ID_PREFIX: &'static str = "proj";

    fn collection(ledger: &Ledger) -> &Vec<Self> {
        &ledger.projects
    }

    fn collection_mut(ledger: &mut Ledger) -> &mut Vec<Self> {
        &mut ledger.projects
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn reference_count(ledger: &Ledger, id: &str) -> usize {
        entries_where(ledger, |entry| entry.project_id == id)
    }
}

impl ReferenceEntity for Supplier {
    const KIND: &'static str = "Supplier";
    const ID_PREFIX: &'static str = "sup";

    fn collection(ledger: &Ledger) -> &Vec<Self> {
        &ledger.suppliers
    }

    fn collection_mut(ledger: &mut Ledger) -> &mut Vec<Self> {
        &mut ledger.suppliers
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn reference_count(ledger: &Ledger, id: &str) -> usize {
        entries_where(ledger, |entry| {
            entry.kind == EntryKind::Expense && entry.counterparty_id == id
        })
    }
}

impl ReferenceEntity for Customer {
    const KIND: &'static str = "Customer";
    const ID_PREFIX: &'static str = "cust";

    fn collection(ledger: &Ledger) -> &Vec<Self> {
        &ledger.customers
    }

    fn collection_mut(ledger: &mut Ledger) -> &mut Vec<Self> {
        &mut ledger.customers
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn reference_count(ledger: &Ledger, id: &str) -> usize {
        entries_where(ledger, |entry| {
            entry.kind == EntryKind::Revenue && entry.counterparty_id == id
        })
    }
}

impl ReferenceEntity for CashAccount {
    const KIND: &'static str = "Cash account";
    const ID_PREFIX: &'static str = "ca";

    fn collection(ledger: &Ledger) -> &Vec<Self> {
        &ledger.cash_accounts
    }

    fn collection_mut(ledger: &mut Ledger) -> &mut Vec<Self> {
        &mut ledger.cash_accounts
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn reference_count(ledger: &Ledger, id: &str) -> usize {
        entries_where(ledger, |entry| entry.cash_account_id == id)
            + ledger
                .settlements
                .iter()
                .filter(|settlement| settlement.cash_account_id == id)
                .count()
    }
}

impl ReferenceEntity for RevenueCategory {
    const KIND: &'static str = "Revenue category";
    const ID_PREFIX: &'static str = "revcat";

    fn collection(ledger: &Ledger) -> &Vec<Self> {
        &ledger.revenue_categories
    }

    fn collection_mut(ledger: &mut Ledger) -> &mut Vec<Self> {
        &mut ledger.revenue_categories
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn reference_count(ledger: &Ledger, id: &str) -> usize {
        entries_where(ledger, |entry| {
            entry.kind == EntryKind::Revenue && entry.references_target(id)
        })
    }
}

impl ReferenceEntity for Product {
    const KIND: &'static str = "Product";
    const ID_PREFIX: &'static str = "prod";

    fn collection(ledger: &Ledger) -> &Vec<Self> {
        &ledger.products
    }

    fn collection_mut(ledger: &mut Ledger) -> &mut Vec<Self> {
        &mut ledger.products
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }

    fn reference_count(ledger: &Ledger, id: &str) -> usize {
        entries_where(ledger, |entry| {
            entry
                .line_items
                .iter()
                .any(|line| line.product_id.as_deref() == Some(id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn add_assigns_prefixed_identifier() {
        let mut ledger = Ledger::new();
        let supplier =
            EntityService::add(&mut ledger, Supplier::new("", "Hidráulica Central")).unwrap();
        assert!(supplier.id.starts_with("sup-"));
        assert_eq!(ledger.suppliers.len(), 1);
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut ledger = Ledger::new();
        let err = EntityService::add(&mut ledger, Project::new("", "   ")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(ledger.projects.is_empty());
    }

    #[test]
    fn update_and_delete_ignore_unknown_ids() {
        let mut ledger = Ledger::new();
        let updated =
            EntityService::update(&mut ledger, Customer::new("cust-404", "Ghost")).unwrap();
        assert!(!updated);
        assert!(!EntityService::delete::<Customer>(&mut ledger, "cust-404").unwrap());
    }

    #[test]
    fn update_replaces_in_place() {
        let mut ledger = seed::seed_ledger();
        let mut account = ledger.cash_account("ca-002").cloned().unwrap();
        account.bank = Some("Banco Beta".into());
        assert!(EntityService::update(&mut ledger, account).unwrap());
        assert_eq!(
            ledger.cash_account("ca-002").unwrap().bank.as_deref(),
            Some("Banco Beta")
        );
    }

    #[test]
    fn unreferenced_entities_can_be_deleted() {
        let mut ledger = seed::seed_ledger();
        assert!(EntityService::delete::<Project>(&mut ledger, "proj-003").unwrap());
        assert!(ledger.project("proj-003").is_none());
    }

    #[test]
    fn list_sorts_by_name() {
        let ledger = seed::seed_ledger();
        let names: Vec<_> = EntityService::list::<Project>(&ledger)
            .into_iter()
            .map(|project| project.name.clone())
            .collect();
        let mut sorted = names.clone();
        sorted.sort_by_key(|name| name.to_lowercase());
        assert_eq!(names, sorted);
    }
}
