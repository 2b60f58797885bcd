//! Initial data a fresh installation starts with.

use obra_domain::{
    CashAccount, CostCenter, Customer, Ledger, Product, Project, RevenueCategory, Supplier,
    UnitOfMeasure,
};

/// `(id, name, parent, launchable)` in tree order.
const COST_CENTERS: &[(&str, &str, Option<&str>, bool)] = &[
    ("cc-proj", "Custos do Projeto", None, false),
    ("cc-prelim", "Serviços Preliminares", Some("cc-proj"), false),
    ("cc-prelim-marcacao", "Marcação do Local", Some("cc-prelim"), true),
    ("cc-estrutura", "Estrutura", Some("cc-proj"), false),
    ("cc-estrutura-fund", "Fundações", Some("cc-estrutura"), true),
    ("cc-estrutura-concreto", "Concreto Armado", Some("cc-estrutura"), true),
    ("cc-vedacoes", "Vedações e Fechamentos", Some("cc-proj"), false),
    ("cc-vedacoes-alvenaria", "Alvenaria", Some("cc-vedacoes"), false),
    ("cc-prod-cimento", "Cimento CPII", Some("cc-vedacoes-alvenaria"), true),
    ("cc-prod-aco", "Aço CA50", Some("cc-vedacoes-alvenaria"), true),
    ("cc-vedacoes-esquadrias", "Esquadrias", Some("cc-vedacoes"), true),
    ("cc-vedacoes-vidros", "Vidros", Some("cc-vedacoes"), true),
    ("cc-admin", "Administrativo", None, false),
    ("cc-admin-mo", "Mão de Obra", Some("cc-admin"), true),
    ("cc-admin-seg", "Segurança do Trabalho", Some("cc-admin"), true),
    ("cc-admin-equip", "Aluguel de Equipamentos", Some("cc-admin"), true),
    ("cc-marketing", "Marketing", None, true),
    ("cc-corretagem", "Taxas de Corretagem", None, true),
    ("cc-impostos", "Impostos", None, true),
    ("cc-posobra", "Pós-Construção", None, true),
    ("cc-desenv", "Desenvolvimento Imobiliário", None, false),
    ("cc-desenv-arq", "Projeto Arquitetônico", Some("cc-desenv"), true),
    ("cc-terreno", "Aquisição de Terreno", None, true),
];

/// A ledger holding the reference data and cost-center tree, with no entries.
pub fn seed_ledger() -> Ledger {
    let mut ledger = Ledger::new();

    ledger.projects = [
        ("proj-001", "Residencial Alegria", "Construção de edifício residencial de 10 andares."),
        ("proj-002", "Comercial Vision", "Edifício comercial com foco em escritórios modernos."),
        ("proj-003", "Infraestrutura Urbana Leste", "Obras de pavimentação e saneamento."),
    ]
    .into_iter()
    .map(|(id, name, description)| {
        let mut project = Project::new(id, name);
        project.description = Some(description.to_string());
        project
    })
    .collect();

    ledger.suppliers = [
        ("sup-001", "Material Forte Ltda.", "João Silva - (11) 98765-4321"),
        ("sup-002", "Serviços Precisão ME", "Maria Oliveira - (21) 91234-5678"),
        ("sup-003", "Cimento Real S.A.", "Carlos Pereira - (31) 99999-8888"),
    ]
    .into_iter()
    .map(|(id, name, contact)| {
        let mut supplier = Supplier::new(id, name);
        supplier.contact = Some(contact.to_string());
        supplier
    })
    .collect();

    ledger.customers = [
        ("cust-001", "Invest Imóveis Ltda.", "Ana Costa - (41) 98888-7777"),
        ("cust-002", "Família Souza", "Pedro Souza - (51) 97777-6666"),
    ]
    .into_iter()
    .map(|(id, name, contact)| {
        let mut customer = Customer::new(id, name);
        customer.contact = Some(contact.to_string());
        customer
    })
    .collect();

    ledger.cash_accounts = vec![
        CashAccount::new("ca-001", "Banco Alfa - C/C 010203-4"),
        CashAccount::new("ca-002", "Banco Beta - C/C 98765-0"),
        CashAccount::new("ca-003", "Caixa Interno da Obra Alfa"),
    ];

    ledger.revenue_categories = vec![
        RevenueCategory::new("revcat-001", "Venda de Unidade Imobiliária"),
        RevenueCategory::new("revcat-002", "Taxa de Serviço de Construção"),
        RevenueCategory::new("revcat-003", "Aluguel de Equipamento"),
    ];

    ledger.products = vec![
        Product::new("prod1", "Cimento CPII (saco 50kg)", UnitOfMeasure::Custom("sc".into())),
        Product::new("prod2", "Areia Média Lavada", UnitOfMeasure::CubicMeter),
        Product::new("prod3", "Brita 1", UnitOfMeasure::CubicMeter),
        Product::new(
            "prod4",
            "Vergalhão CA50 10mm (barra 12m)",
            UnitOfMeasure::Custom("br".into()),
        ),
    ];

    ledger.cost_centers = COST_CENTERS
        .iter()
        .map(|(id, name, parent, launchable)| {
            CostCenter::new(*id, *name, parent.map(str::to_string)).with_launchable(*launchable)
        })
        .collect();

    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_ids_are_unique_and_parents_resolve() {
        let ledger = seed_ledger();
        let ids: HashSet<_> = ledger.cost_centers.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids.len(), ledger.cost_centers.len());
        for node in &ledger.cost_centers {
            if let Some(parent) = &node.parent_id {
                assert!(ids.contains(parent.as_str()), "{} has unknown parent", node.id);
            }
        }
    }

    #[test]
    fn seed_has_no_activity() {
        let ledger = seed_ledger();
        assert!(ledger.entries.is_empty());
        assert!(ledger.settlements.is_empty());
        assert_eq!(ledger.projects.len(), 3);
        assert_eq!(ledger.products.len(), 4);
    }
}
