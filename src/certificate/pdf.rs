// src/certificate/pdf.rs

use anyhow::Context;
use lopdf::Document;
use tracing::debug;

use crate::error::{PortalError, PortalResult};

/// Copy page `index` (zero-based) of `bytes` into a new single-page PDF.
///
/// `location` only labels errors. Objects no longer reachable after the other
/// pages are dropped are pruned, so output size tracks the kept page.
pub fn extract_page(bytes: &[u8], index: usize, location: &str) -> PortalResult<Vec<u8>> {
    let mut doc = Document::load_mem(bytes)
        .map_err(|e| PortalError::unavailable(location, format!("unreadable PDF: {}", e)))?;

    let pages = doc.get_pages();
    let page_count = pages.len();
    if index >= page_count {
        return Err(PortalError::PageOutOfRange { index, page_count });
    }

    // page numbers are 1-based
    let keep = index as u32 + 1;
    let drop: Vec<u32> = pages.keys().copied().filter(|&n| n != keep).collect();
    doc.delete_pages(&drop);
    let pruned = doc.prune_objects();
    debug!(location, index, page_count, pruned = pruned.len(), "page isolated");

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .with_context(|| format!("serializing page {} of {}", index, location))?;
    if out.is_empty() {
        return Err(PortalError::EmptyArtifact {
            location: location.to_string(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_count, page_labels, pdf_with_pages};

    #[test]
    fn extracts_requested_page_only() {
        let src = pdf_with_pages(10);
        assert_eq!(page_count(&src), 10);

        let out = extract_page(&src, 6, "combined.pdf").unwrap();
        assert_eq!(page_count(&out), 1);
        assert_eq!(page_labels(&out), vec!["Page 7".to_string()]);
    }

    #[test]
    fn last_page_is_in_range() {
        let src = pdf_with_pages(3);
        let out = extract_page(&src, 2, "combined.pdf").unwrap();
        assert_eq!(page_labels(&out), vec!["Page 3".to_string()]);
    }

    #[test]
    fn index_equal_to_count_is_out_of_range() {
        let src = pdf_with_pages(3);
        match extract_page(&src, 3, "combined.pdf") {
            Err(PortalError::PageOutOfRange { index, page_count }) => {
                assert_eq!(index, 3);
                assert_eq!(page_count, 3);
            }
            other => panic!("expected PageOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let src = pdf_with_pages(5);
        let a = extract_page(&src, 1, "combined.pdf").unwrap();
        let b = extract_page(&src, 1, "combined.pdf").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn garbage_is_unavailable() {
        assert!(matches!(
            extract_page(b"%PDF-nope", 0, "combined.pdf"),
            Err(PortalError::ResourceUnavailable { .. })
        ));
    }
}
