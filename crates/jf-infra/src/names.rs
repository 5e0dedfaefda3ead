use std::collections::BTreeSet;

use jf_core::FileEntry;
use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};

/// File name templates per industry. `{n}` is a two digit counter, `{year}`,
/// `{q}` and `{month}` are dates.
fn templates_for(industry: &str) -> &'static [&'static str] {
    match industry {
        "banking" => &[
            "ledger_{year}_q{q}.db",
            "accounts_{n}.dat",
            "wire_transfers_{month}.csv",
            "loan_portfolio_{year}.xlsx",
            "branch_audit_{n}.pdf",
            "atm_journal_{month}.log",
            "customer_kyc_{n}.dat",
        ],
        "healthcare" => &[
            "patient_records_{n}.db",
            "lab_results_{month}.csv",
            "prescriptions_{year}.dat",
            "imaging_index_{n}.dat",
            "billing_codes_{year}.xlsx",
            "appointments_{month}.csv",
            "consent_forms_{n}.pdf",
        ],
        "legal" => &[
            "case_file_{n}.pdf",
            "discovery_{year}_{n}.docx",
            "billing_hours_{month}.xlsx",
            "contracts_index_{year}.db",
            "depositions_{n}.docx",
            "court_dates_{year}.csv",
        ],
        "retail" => &[
            "inventory_{month}.csv",
            "pos_transactions_{n}.db",
            "supplier_orders_{year}.xlsx",
            "loyalty_members_{n}.dat",
            "price_list_{year}_q{q}.csv",
            "returns_{month}.log",
        ],
        "manufacturing" => &[
            "cnc_programs_{n}.dat",
            "quality_reports_{month}.pdf",
            "bill_of_materials_{n}.xlsx",
            "production_schedule_{year}.csv",
            "sensor_logs_{month}.log",
            "tooling_specs_{n}.docx",
        ],
        "government" => &[
            "registry_{year}_{n}.db",
            "permits_{month}.csv",
            "tax_filings_{year}.dat",
            "procurement_{n}.pdf",
            "minutes_{year}_{month}.docx",
            "census_extract_{n}.dat",
        ],
        "education" => &[
            "enrollment_{year}.db",
            "grades_term{q}_{year}.csv",
            "transcripts_{n}.pdf",
            "staff_payroll_{month}.xlsx",
            "timetable_{year}.csv",
            "library_catalog_{n}.dat",
        ],
        "technology" => &[
            "build_artifacts_{n}.dat",
            "customer_tickets_{month}.db",
            "source_snapshot_{n}.dat",
            "license_keys_{year}.csv",
            "deploy_{year}_{n}.log",
            "roadmap_q{q}.docx",
        ],
        "media" => &[
            "raw_footage_{n}.dat",
            "edit_decision_{n}.xml",
            "music_cues_{month}.csv",
            "release_schedule_{year}.xlsx",
            "color_grade_{n}.dat",
            "contracts_talent_{year}.pdf",
        ],
        _ => CORPORATE,
    }
}

const CORPORATE: &[&str] = &[
    "financials_{year}_q{q}.xlsx",
    "employees_{n}.db",
    "invoices_{month}.csv",
    "meeting_notes_{n}.docx",
    "backup_manifest_{n}.dat",
    "policies_{year}.pdf",
    "vendor_list_{year}.csv",
];

const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

fn fill_template<R: Rng + ?Sized>(template: &str, rng: &mut R) -> String {
    template
        .replace("{n}", &format!("{:02}", rng.gen_range(1..=99)))
        .replace("{year}", &rng.gen_range(2015..=2024).to_string())
        .replace("{q}", &rng.gen_range(1..=4).to_string())
        .replace("{month}", MONTHS[rng.gen_range(0..MONTHS.len())])
}

fn with_suffix(name: &str, k: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{k}.{ext}"),
        None => format!("{name}_{k}"),
    }
}

/// `count` distinct file names for `industry`; unknown industries use the
/// corporate table.
pub fn file_names<R: Rng + ?Sized>(industry: &str, count: usize, rng: &mut R) -> Vec<String> {
    let templates = templates_for(industry);
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        let template = templates.choose(rng).copied().unwrap_or("file_{n}.dat");
        let mut name = fill_template(template, rng);
        let mut k = 2;
        while seen.contains(&name) {
            name = with_suffix(&fill_template(template, rng), k);
            k += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

/// Size range in KB by extension.
fn size_range_kb(name: &str) -> (u32, u32) {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("db") => (512, 48 * 1024),
        Some("dat") => (128, 12 * 1024),
        Some("xlsx") | Some("csv") => (12, 4 * 1024),
        Some("pdf") | Some("docx") => (24, 3 * 1024),
        Some("log") | Some("xml") => (2, 640),
        _ => (8, 2048),
    }
}

pub fn format_size(kb: u32) -> String {
    if kb >= 1024 {
        format!("{:.1} MB", kb as f64 / 1024.0)
    } else {
        format!("{kb} KB")
    }
}

pub fn random_files<R: Rng + ?Sized>(industry: &str, count: usize, corrupted: bool, rng: &mut R) -> Vec<FileEntry> {
    file_names(industry, count, rng)
        .into_iter()
        .map(|name| {
            let (lo, hi) = size_range_kb(&name);
            let size = format_size(rng.gen_range(lo..=hi));
            FileEntry { name, size, corrupted }
        })
        .collect()
}

fn slug(name: &str) -> String {
    let mut out = String::new();
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let mut out: String = out.chars().take(24).collect();
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("host");
    }
    out
}

/// `{client-slug}-{purpose}-{hex4}`. The suffix comes from a hash of the
/// client id and purpose, so a client's fileserver always has the same name.
pub fn hostname(client_id: &str, client_name: &str, purpose: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_id.as_bytes());
    hasher.update(b":");
    hasher.update(purpose.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}-{}", slug(client_name), purpose, &digest[..4])
}
