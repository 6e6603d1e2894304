//! End-to-end document output

mod common;

use common::{asha, groceries, renderer, renderer_in, scratch_dir};
use receipt_renderer::{Locale, OutputMode, ReceiptOutput};

fn page_count(pdf: &[u8]) -> usize {
    let count = |needle: &[u8]| pdf.windows(needle.len()).filter(|w| *w == needle).count();
    count(b"/Type /Page") - count(b"/Type /Pages")
}

#[test]
fn asha_cash_receipt_is_a_single_page_pdf() {
    let r = renderer();
    let output = r.render_localized(&asha(), Locale::En, OutputMode::ReturnFile).unwrap();
    let file = match output {
        ReceiptOutput::File(file) => file,
        other => panic!("expected file, got {:?}", other),
    };
    assert_eq!(file.mime, "application/pdf");
    assert!(file.bytes.starts_with(b"%PDF-"));
    assert_eq!(page_count(&file.bytes), 1);
    assert!(file.filename.starts_with("Donation_Receipt_Asha_"));
    assert!(file.filename.ends_with("_en.pdf"));
    assert_eq!(r.surface_host().attached_count(), 0);
}

#[test]
fn save_to_disk_writes_named_file() {
    let scratch = scratch_dir("save");
    let dir = scratch.path().to_path_buf();
    let r = renderer_in(dir.clone());
    let output = r.render_localized(&groceries(2), Locale::Kn, OutputMode::SaveToDisk).unwrap();

    let path = output.path().expect("saved path").to_path_buf();
    assert_eq!(path.parent(), Some(dir.as_path()));
    assert!(output.filename().starts_with("Donation_Receipt_Ravi_"));
    assert!(output.filename().ends_with("_kn.pdf"));

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(page_count(&bytes), 1);

    let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().filter_map(|e| e.ok()).collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn donor_names_with_slashes_stay_in_output_dir() {
    let scratch = scratch_dir("slashes");
    let dir = scratch.path().to_path_buf();
    let r = renderer_in(dir.clone());
    let record = receipt_renderer::DonationRecord::new("A/B Trust", "10", receipt_renderer::PaymentMode::Cash, "1");
    let output = r.render_localized(&record, Locale::En, OutputMode::SaveToDisk).unwrap();
    let path = output.path().unwrap();
    assert_eq!(path.parent(), Some(dir.as_path()));
    assert!(output.filename().starts_with("Donation_Receipt_A_B Trust_"));
}

#[test]
fn document_info_names_receipt() {
    let record = asha().with_receipt_no("123456");
    let file = renderer()
        .render_localized(&record, Locale::En, OutputMode::ReturnFile)
        .unwrap()
        .into_file()
        .unwrap();
    let needle = b"Donation Receipt #123456";
    assert!(file.bytes.windows(needle.len()).any(|w| w == needle));
}
