//! Report assembly: an append-only fold over completed batches.
//!
//! The aggregator is deliberately not logic-bearing. It is seeded with a
//! fixed header (document name plus a generation banner) and appends one
//! section per completed batch, strictly in page order, the moment the batch
//! completes. Sections are never reordered or removed, even when a later
//! page fails, so a partial report is valid and exportable at any time.

/// One appended page section.
#[derive(Debug, Clone)]
struct ReportSection {
    page_index: usize,
    text: String,
}

/// Ordered textual report over a single document.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    document_name: String,
    sections: Vec<ReportSection>,
}

impl ReportAggregator {
    /// Start an empty report for `document_name`.
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            sections: Vec::new(),
        }
    }

    /// Append the analysis for the page at `page_index`.
    ///
    /// Callers append in ascending page order; the sequential loop guarantees
    /// this, and the debug assertion documents it.
    pub fn append_page(&mut self, page_index: usize, text: &str) {
        debug_assert!(
            self.sections
                .last()
                .map(|s| s.page_index < page_index)
                .unwrap_or(true),
            "sections must be appended in page order"
        );
        self.sections.push(ReportSection {
            page_index,
            text: text.to_string(),
        });
    }

    /// Number of appended sections. Monotonically non-decreasing over the
    /// life of a job.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Page indices of the appended sections, in append order.
    pub fn section_pages(&self) -> Vec<usize> {
        self.sections.iter().map(|s| s.page_index).collect()
    }

    /// Render the full report: header banner plus every section so far.
    pub fn render(&self) -> String {
        let mut out = format!(
            "# Document Analysis Report\n\n**Source:** {}\n\n---\n\n",
            self.document_name
        );
        for section in &self.sections {
            out.push_str(&format!(
                "## Page {} Analysis\n\n{}\n\n---\n\n",
                section.page_index + 1,
                section.text
            ));
        }
        out
    }

    /// Whitespace-separated word count of the rendered report.
    pub fn word_count(&self) -> usize {
        self.render().split_whitespace().count()
    }

    /// Deterministic suggested filename for exporting this report.
    pub fn suggested_filename(&self) -> String {
        let stem = self
            .document_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.document_name)
            .trim_end_matches(".pdf")
            .trim_end_matches(".PDF");
        let slug: String = stem
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_analysis.md", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_the_document() {
        let report = ReportAggregator::new("exam.pdf");
        let text = report.render();
        assert!(text.starts_with("# Document Analysis Report"));
        assert!(text.contains("exam.pdf"));
        assert_eq!(report.section_count(), 0);
    }

    #[test]
    fn sections_accumulate_in_page_order() {
        let mut report = ReportAggregator::new("doc.pdf");
        report.append_page(0, "first");
        report.append_page(2, "third");
        assert_eq!(report.section_count(), 2);
        assert_eq!(report.section_pages(), vec![0, 2]);

        let text = report.render();
        let first_at = text.find("## Page 1 Analysis").unwrap();
        let third_at = text.find("## Page 3 Analysis").unwrap();
        assert!(first_at < third_at);
        assert!(text.contains("first"));
        assert!(text.contains("third"));
    }

    #[test]
    fn partial_report_is_renderable() {
        let mut report = ReportAggregator::new("doc.pdf");
        report.append_page(0, "only page one done");
        assert!(report.render().contains("only page one done"));
        assert!(report.word_count() > 0);
    }

    #[test]
    fn suggested_filename_is_deterministic() {
        let report = ReportAggregator::new("My Exam 2024.pdf");
        assert_eq!(report.suggested_filename(), "My_Exam_2024_analysis.md");
        // Same input, same name.
        let again = ReportAggregator::new("My Exam 2024.pdf");
        assert_eq!(report.suggested_filename(), again.suggested_filename());
    }

    #[test]
    fn suggested_filename_strips_directories() {
        let report = ReportAggregator::new("/tmp/scans/chapter.pdf");
        assert_eq!(report.suggested_filename(), "chapter_analysis.md");
    }
}
