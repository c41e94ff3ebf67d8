use std::path::PathBuf;

use crate::mirror::{
    AttachmentSpec, CategorySpec, DetailSpec, IdPattern, NamingRule, RecordSchema, SortKey,
    StatusLabel,
};

const EVENT_SCHEMA: RecordSchema = RecordSchema::new(&["id", "performed_at"], &[]);

const ACCOUNTING_ENTITY_SCHEMA: RecordSchema = RecordSchema::new(&["id", "period"], &[]);
const ACCOUNTING_DETAIL_SCHEMA: RecordSchema = RecordSchema::new(&["id", "period"], &[]);

const INVOICE_ENTITY_SCHEMA: RecordSchema = RecordSchema::new(&["id", "uuid"], &[]);
const INVOICE_DETAIL_SCHEMA: RecordSchema =
    RecordSchema::new(&["id", "uuid"], &["attachments.download_link"]);

const COST_ENTITY_SCHEMA: RecordSchema = RecordSchema::new(&["uuid", "created_at"], &[]);
const COST_DETAIL_SCHEMA: RecordSchema = RecordSchema::new(
    &["uuid"],
    &["attachments.download_url", "attachments.file_url"],
);

const INVOICE_ATTACHMENTS: AttachmentSpec = AttachmentSpec {
    field: "attachments",
    fetch_separately: true,
    name_field: "name",
    link_field: "download_link",
};

const COST_ATTACHMENTS: AttachmentSpec = AttachmentSpec {
    field: "attachments",
    fetch_separately: false,
    name_field: "file_name",
    link_field: "download_url",
};

const COST_REJECTED: StatusLabel = StatusLabel {
    field: "statuses",
    symbol: "cost_rejected",
    label: "(REJECTED)",
};

const ACCOUNTING: &[(&str, &str)] = &[
    ("JPK", "saf_v7_files"),
    ("VAT_EU", "vat_eu_taxes"),
    ("REV_TAX", "income_taxes"),
    ("KPiR", "books"),
    ("INSUR", "insurance_fees"),
];

// (name, endpoint, has downloadable attachments)
const INVOICES: &[(&str, &str, bool)] = &[
    ("DAILY_REV", "daily_revenues", false),
    ("INT_EVI", "internal_evidences", false),
    ("FISC_REP", "fiscal_reports", false),
    ("INT_INV", "internal_invoices", false),
    ("OSS_CORR_INV", "corrective_oss_invoices", false),
    ("OSS_INV", "oss_invoices", false),
    ("FINAL_INV", "final_invoices", false),
    ("ADV_INV", "advance_invoices", false),
    ("MARG_INV", "margin_invoices", false),
    ("CORR_INV", "corrective_invoices", false),
    ("INV", "invoices", true),
];

pub fn default_catalog(page_size: u32) -> Vec<CategorySpec> {
    let mut catalog = vec![account_events(page_size)];
    catalog.extend(
        ACCOUNTING
            .iter()
            .map(|(name, endpoint)| accounting(name, endpoint, page_size)),
    );
    catalog.extend(
        INVOICES
            .iter()
            .map(|(name, endpoint, attachments)| invoices(name, endpoint, page_size, *attachments)),
    );
    catalog.push(costs(page_size));
    catalog
}

pub fn account_events(page_size: u32) -> CategorySpec {
    CategorySpec {
        name: "events".to_string(),
        archive_dir: PathBuf::from("account").join("events"),
        endpoint: "account/activities".to_string(),
        page_size,
        id_field: "id",
        id_pattern: IdPattern::Numeric,
        sort: SortKey::Field("performed_at"),
        naming: NamingRule::Id,
        entity_schema: EVENT_SCHEMA,
        detail: None,
    }
}

pub fn accounting(name: &str, endpoint: &str, page_size: u32) -> CategorySpec {
    CategorySpec {
        name: name.to_string(),
        archive_dir: PathBuf::from("accounting").join(name),
        endpoint: endpoint.to_string(),
        page_size,
        id_field: "id",
        id_pattern: IdPattern::Numeric,
        sort: SortKey::Field("period"),
        naming: NamingRule::Prefixed("period"),
        entity_schema: ACCOUNTING_ENTITY_SCHEMA,
        detail: Some(DetailSpec::new("id", ACCOUNTING_DETAIL_SCHEMA)),
    }
}

pub fn invoices(name: &str, endpoint: &str, page_size: u32, with_attachments: bool) -> CategorySpec {
    let mut detail = DetailSpec::new("uuid", INVOICE_DETAIL_SCHEMA);
    if with_attachments {
        detail = detail.with_attachments(INVOICE_ATTACHMENTS);
    }
    CategorySpec {
        name: name.to_string(),
        archive_dir: PathBuf::from("invoices").join(name),
        endpoint: endpoint.to_string(),
        page_size,
        id_field: "id",
        id_pattern: IdPattern::Numeric,
        sort: SortKey::Field("id"),
        naming: NamingRule::Id,
        entity_schema: INVOICE_ENTITY_SCHEMA,
        detail: Some(detail),
    }
}

pub fn costs(page_size: u32) -> CategorySpec {
    CategorySpec {
        name: "costs".to_string(),
        archive_dir: PathBuf::from("costs"),
        endpoint: "documents/costs".to_string(),
        page_size,
        id_field: "uuid",
        id_pattern: IdPattern::Uuid,
        sort: SortKey::Timestamp("created_at"),
        naming: NamingRule::Prefixed("issue_date"),
        entity_schema: COST_ENTITY_SCHEMA,
        detail: Some(
            DetailSpec::new("uuid", COST_DETAIL_SCHEMA)
                .with_attachments(COST_ATTACHMENTS)
                .with_label(COST_REJECTED),
        ),
    }
}
