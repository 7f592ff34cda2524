//! Static datasets shown by the dashboard.
//!
//! These stand in for a backend that does not exist: past job records,
//! quality and performance figures, reference genome catalogues and the
//! placeholder result panels.

use crate::model::{JobKind, SummaryMetric};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Completed,
    Failed,
    Processing,
}

impl RecordStatus {
    pub fn label(self) -> &'static str {
        match self {
            RecordStatus::Completed => "completed",
            RecordStatus::Failed => "failed",
            RecordStatus::Processing => "processing",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub id: &'static str,
    pub filename: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: RecordStatus,
    pub date: &'static str,
    pub duration: &'static str,
    pub mutations: Option<u32>,
    pub similarity: Option<f64>,
    pub size: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceGenome {
    pub id: &'static str,
    pub name: &'static str,
    pub organism: &'static str,
    pub size: &'static str,
    pub released: &'static str,
    pub quality: &'static str,
    pub downloads: &'static str,
    pub source: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomSequence {
    pub id: &'static str,
    pub name: &'static str,
    pub organism: &'static str,
    pub size: &'static str,
    pub uploaded: &'static str,
    pub uses: u32,
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub id: &'static str,
    pub title: &'static str,
    pub period: &'static str,
    pub generated: &'static str,
    pub status: RecordStatus,
    pub score: f64,
    pub analyses: u32,
    pub issues: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricRating {
    Excellent,
    Good,
}

impl MetricRating {
    pub fn label(self) -> &'static str {
        match self {
            MetricRating::Excellent => "excellent",
            MetricRating::Good => "good",
        }
    }
}

/// A quality percentage tracked against a target.
///
/// For `inverted` metrics (error rates) lower is better.
#[derive(Debug, Clone, Serialize)]
pub struct QualityMetric {
    pub name: &'static str,
    pub value: f64,
    pub target: f64,
    pub rating: MetricRating,
    pub inverted: bool,
}

impl QualityMetric {
    /// Gauge fill in percent; inverted metrics fill with their headroom.
    pub fn gauge_percent(&self) -> f64 {
        let v = if self.inverted {
            100.0 - self.value
        } else {
            self.value
        };
        v.clamp(0.0, 100.0)
    }

    pub fn meets_target(&self) -> bool {
        if self.inverted {
            self.value <= self.target
        } else {
            self.value >= self.target
        }
    }

    /// e.g. "1.2% above target", or "1.2% below target" for an error rate.
    pub fn target_delta(&self) -> String {
        let side = if self.value >= self.target {
            "above"
        } else {
            "below"
        };
        format!("{:.1}% {side} target", (self.value - self.target).abs())
    }
}

/// One headline card: a value with a trend or context note.
#[derive(Debug, Clone, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: &'static str,
    pub note: &'static str,
    /// Fill of the card's gauge, for cards that draw one.
    pub gauge: Option<u8>,
}

/// Read-only data provider for the dashboard's catalogue pages.
pub trait Catalog {
    fn history(&self) -> &[HistoryRecord];
    fn quality_overview(&self) -> &[StatCard];
    fn quality_metrics(&self) -> &[QualityMetric];
    fn quality_reports(&self) -> &[QualityReport];
    fn performance_metrics(&self) -> &[StatCard];
    fn reference_genomes(&self) -> &[ReferenceGenome];
    fn custom_sequences(&self) -> &[CustomSequence];
    /// Result panel shown once a job of `kind` completes.
    fn sample_results(&self, kind: JobKind) -> Vec<SummaryMetric>;
}

/// Catalog backed by compiled-in fixtures.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl Catalog for StaticCatalog {
    fn history(&self) -> &[HistoryRecord] {
        HISTORY
    }

    fn quality_overview(&self) -> &[StatCard] {
        QUALITY_OVERVIEW
    }

    fn quality_metrics(&self) -> &[QualityMetric] {
        QUALITY_METRICS
    }

    fn quality_reports(&self) -> &[QualityReport] {
        QUALITY_REPORTS
    }

    fn performance_metrics(&self) -> &[StatCard] {
        PERFORMANCE
    }

    fn reference_genomes(&self) -> &[ReferenceGenome] {
        REFERENCE_GENOMES
    }

    fn custom_sequences(&self) -> &[CustomSequence] {
        CUSTOM_SEQUENCES
    }

    fn sample_results(&self, kind: JobKind) -> Vec<SummaryMetric> {
        let rows: &[(&str, &str)] = match kind {
            JobKind::Analysis => &[
                ("Base Pairs", "4,582"),
                ("GC Content", "58.3%"),
                ("Mutations", "23"),
            ],
            JobKind::Comparison => &[
                ("Average Similarity", "94.7%"),
                ("Conserved Regions", "156"),
                ("Variant Positions", "23"),
                ("Phylogenetic Distance", "0.023"),
                ("Gap Percentage", "2.1%"),
                ("Conservation Score", "8.7/10"),
            ],
        };
        rows.iter()
            .map(|(label, value)| SummaryMetric {
                label: label.to_string(),
                value: value.to_string(),
            })
            .collect()
    }
}

/// Filters applied on the history page. `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub search: String,
    pub status: Option<RecordStatus>,
    pub kind: Option<String>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &HistoryRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || record.filename.to_lowercase().contains(&needle)
            || record.id.to_lowercase().contains(&needle);
        let matches_status = self.status.map_or(true, |s| s == record.status);
        let matches_kind = self.kind.as_deref().map_or(true, |k| k == record.kind);
        matches_search && matches_status && matches_kind
    }

    pub fn apply<'a>(&self, records: &'a [HistoryRecord]) -> Vec<&'a HistoryRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Case-insensitive search over id, name and organism.
pub fn search_references<'a>(
    genomes: &'a [ReferenceGenome],
    query: &str,
) -> Vec<&'a ReferenceGenome> {
    let needle = query.trim().to_lowercase();
    genomes
        .iter()
        .filter(|g| {
            needle.is_empty()
                || g.id.to_lowercase().contains(&needle)
                || g.name.to_lowercase().contains(&needle)
                || g.organism.to_lowercase().contains(&needle)
        })
        .collect()
}

static HISTORY: &[HistoryRecord] = &[
    HistoryRecord {
        id: "ANL-2024-001",
        filename: "covid_variant_b117.fasta",
        kind: "Mutation Detection",
        status: RecordStatus::Completed,
        date: "2024-01-15 14:30",
        duration: "3.2s",
        mutations: Some(23),
        similarity: Some(98.7),
        size: "12.4 KB",
    },
    HistoryRecord {
        id: "ANL-2024-002",
        filename: "patient_genome_chr21.fa",
        kind: "Full Analysis",
        status: RecordStatus::Completed,
        date: "2024-01-15 13:45",
        duration: "45.7s",
        mutations: Some(156),
        similarity: Some(94.2),
        size: "2.1 MB",
    },
    HistoryRecord {
        id: "ANL-2024-003",
        filename: "viral_sample_delta.fas",
        kind: "GC Content",
        status: RecordStatus::Failed,
        date: "2024-01-15 12:20",
        duration: "0.8s",
        mutations: None,
        similarity: None,
        size: "8.9 KB",
    },
    HistoryRecord {
        id: "ANL-2024-004",
        filename: "reference_human_exome.fasta",
        kind: "Comparison",
        status: RecordStatus::Processing,
        date: "2024-01-15 11:10",
        duration: "ongoing",
        mutations: None,
        similarity: None,
        size: "5.7 MB",
    },
    HistoryRecord {
        id: "ANL-2024-005",
        filename: "bacterial_16s_sample.fa",
        kind: "Translation",
        status: RecordStatus::Completed,
        date: "2024-01-14 16:22",
        duration: "2.1s",
        mutations: Some(8),
        similarity: Some(99.1),
        size: "4.3 KB",
    },
    HistoryRecord {
        id: "ANL-2024-006",
        filename: "plant_chloroplast_seq.fasta",
        kind: "Full Analysis",
        status: RecordStatus::Completed,
        date: "2024-01-14 15:05",
        duration: "12.4s",
        mutations: Some(45),
        similarity: Some(96.8),
        size: "156 KB",
    },
];

static QUALITY_OVERVIEW: &[StatCard] = &[
    StatCard {
        label: "Overall Quality Score",
        value: "96.4%",
        note: "+2.1% from last week",
        gauge: None,
    },
    StatCard {
        label: "Analyses This Week",
        value: "1,247",
        note: "+15.3% from last week",
        gauge: None,
    },
    StatCard {
        label: "Success Rate",
        value: "99.2%",
        note: "+0.3% from last week",
        gauge: None,
    },
    StatCard {
        label: "Avg Processing Time",
        value: "2.8s",
        note: "-12.5% from last week",
        gauge: None,
    },
];

static QUALITY_METRICS: &[QualityMetric] = &[
    QualityMetric {
        name: "Sequence Accuracy",
        value: 99.2,
        target: 98.0,
        rating: MetricRating::Excellent,
        inverted: false,
    },
    QualityMetric {
        name: "Processing Speed",
        value: 94.5,
        target: 90.0,
        rating: MetricRating::Good,
        inverted: false,
    },
    QualityMetric {
        name: "Error Rate",
        value: 0.8,
        target: 2.0,
        rating: MetricRating::Excellent,
        inverted: true,
    },
    QualityMetric {
        name: "Data Integrity",
        value: 99.9,
        target: 99.0,
        rating: MetricRating::Excellent,
        inverted: false,
    },
    QualityMetric {
        name: "Analysis Coverage",
        value: 87.3,
        target: 85.0,
        rating: MetricRating::Good,
        inverted: false,
    },
    QualityMetric {
        name: "User Satisfaction",
        value: 92.7,
        target: 88.0,
        rating: MetricRating::Excellent,
        inverted: false,
    },
];

static QUALITY_REPORTS: &[QualityReport] = &[
    QualityReport {
        id: "QR-2024-001",
        title: "Weekly Quality Assessment",
        period: "Jan 8-14, 2024",
        generated: "2024-01-15",
        status: RecordStatus::Completed,
        score: 94.2,
        analyses: 247,
        issues: 3,
    },
    QualityReport {
        id: "QR-2024-002",
        title: "Monthly Performance Review",
        period: "December 2023",
        generated: "2024-01-01",
        status: RecordStatus::Completed,
        score: 96.8,
        analyses: 1024,
        issues: 1,
    },
    QualityReport {
        id: "QR-2024-003",
        title: "Algorithm Validation Report",
        period: "Q4 2023",
        generated: "2023-12-31",
        status: RecordStatus::Completed,
        score: 98.1,
        analyses: 3567,
        issues: 0,
    },
];

static PERFORMANCE: &[StatCard] = &[
    StatCard {
        label: "Processing Speed",
        value: "2.8s",
        note: "15% faster",
        gauge: Some(85),
    },
    StatCard {
        label: "System Load",
        value: "34%",
        note: "Optimal range",
        gauge: Some(34),
    },
    StatCard {
        label: "Active Users",
        value: "1,247",
        note: "23% more today",
        gauge: Some(62),
    },
    StatCard {
        label: "Storage Used",
        value: "67%",
        note: "2.3GB / 10GB",
        gauge: Some(67),
    },
];

static REFERENCE_GENOMES: &[ReferenceGenome] = &[
    ReferenceGenome {
        id: "hg38",
        name: "Human Genome (GRCh38/hg38)",
        organism: "Homo sapiens",
        size: "3.2 Gb",
        released: "2013-12-17",
        quality: "Complete",
        downloads: "2.1M",
        source: "NCBI",
        description: "Latest human reference genome assembly",
    },
    ReferenceGenome {
        id: "mm10",
        name: "Mouse Genome (GRCm38/mm10)",
        organism: "Mus musculus",
        size: "2.7 Gb",
        released: "2011-12-09",
        quality: "Complete",
        downloads: "890K",
        source: "NCBI",
        description: "Mouse reference genome assembly",
    },
    ReferenceGenome {
        id: "dm6",
        name: "Drosophila Genome (dm6)",
        organism: "Drosophila melanogaster",
        size: "143 Mb",
        released: "2014-08-01",
        quality: "Complete",
        downloads: "567K",
        source: "FlyBase",
        description: "Fruit fly reference genome",
    },
    ReferenceGenome {
        id: "ce11",
        name: "C. elegans Genome (ce11)",
        organism: "Caenorhabditis elegans",
        size: "100 Mb",
        released: "2013-02-07",
        quality: "Complete",
        downloads: "234K",
        source: "WormBase",
        description: "Nematode reference genome",
    },
    ReferenceGenome {
        id: "sc3",
        name: "S. cerevisiae Genome (sacCer3)",
        organism: "Saccharomyces cerevisiae",
        size: "12 Mb",
        released: "2011-04-15",
        quality: "Complete",
        downloads: "445K",
        source: "SGD",
        description: "Baker's yeast reference genome",
    },
    ReferenceGenome {
        id: "ecoli",
        name: "E. coli Genome (K-12 MG1655)",
        organism: "Escherichia coli",
        size: "4.6 Mb",
        released: "2020-03-10",
        quality: "Complete",
        downloads: "1.2M",
        source: "NCBI",
        description: "E. coli laboratory strain genome",
    },
];

static CUSTOM_SEQUENCES: &[CustomSequence] = &[
    CustomSequence {
        id: "ref001",
        name: "COVID-19 Reference Genome",
        organism: "SARS-CoV-2",
        size: "29.9 Kb",
        uploaded: "2024-01-10",
        uses: 156,
        is_public: true,
    },
    CustomSequence {
        id: "ref002",
        name: "Mitochondrial DNA Reference",
        organism: "Homo sapiens",
        size: "16.6 Kb",
        uploaded: "2024-01-08",
        uses: 89,
        is_public: false,
    },
    CustomSequence {
        id: "ref003",
        name: "BRCA1 Gene Sequence",
        organism: "Homo sapiens",
        size: "81.2 Kb",
        uploaded: "2024-01-05",
        uses: 234,
        is_public: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_keeps_every_record() {
        let catalog = StaticCatalog;
        let all = HistoryFilter::default().apply(catalog.history());
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn search_matches_filename_or_id_case_insensitively() {
        let filter = HistoryFilter {
            search: "COVID".into(),
            ..Default::default()
        };
        let hits = filter.apply(StaticCatalog.history());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "ANL-2024-001");

        let filter = HistoryFilter {
            search: "anl-2024-00".into(),
            ..Default::default()
        };
        assert_eq!(filter.apply(StaticCatalog.history()).len(), 6);
    }

    #[test]
    fn status_and_type_filters_combine() {
        let filter = HistoryFilter {
            search: String::new(),
            status: Some(RecordStatus::Completed),
            kind: Some("Full Analysis".into()),
        };
        let ids: Vec<_> = filter
            .apply(StaticCatalog.history())
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["ANL-2024-002", "ANL-2024-006"]);

        let failed = HistoryFilter {
            status: Some(RecordStatus::Failed),
            ..Default::default()
        };
        assert_eq!(failed.apply(StaticCatalog.history())[0].mutations, None);
    }

    #[test]
    fn reference_search_covers_organism() {
        let genomes = StaticCatalog.reference_genomes();
        let hits = search_references(genomes, "homo");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "hg38");
        assert_eq!(search_references(genomes, "").len(), 6);
    }

    #[test]
    fn quality_metrics_compare_against_their_targets() {
        let metrics = StaticCatalog.quality_metrics();
        assert_eq!(metrics.len(), 6);
        assert!(metrics.iter().all(|m| m.meets_target()));

        let accuracy = &metrics[0];
        assert_eq!(accuracy.name, "Sequence Accuracy");
        assert_eq!(accuracy.gauge_percent(), 99.2);
        assert_eq!(accuracy.target_delta(), "1.2% above target");
    }

    #[test]
    fn error_rate_is_better_when_lower() {
        let error_rate = StaticCatalog
            .quality_metrics()
            .iter()
            .find(|m| m.inverted)
            .unwrap();
        assert_eq!(error_rate.name, "Error Rate");
        assert!(error_rate.meets_target());
        assert!((error_rate.gauge_percent() - 99.2).abs() < 1e-9);
        assert_eq!(error_rate.target_delta(), "1.2% below target");

        let worse = QualityMetric {
            value: 3.5,
            ..error_rate.clone()
        };
        assert!(!worse.meets_target());
        assert_eq!(worse.target_delta(), "1.5% above target");

        let short = QualityMetric {
            value: 80.0,
            ..StaticCatalog.quality_metrics()[4].clone()
        };
        assert!(!short.meets_target());
        assert_eq!(short.target_delta(), "5.0% below target");
    }

    #[test]
    fn quality_and_performance_fixtures() {
        let reports = StaticCatalog.quality_reports();
        let ids: Vec<_> = reports.iter().map(|r| r.id).collect();
        assert_eq!(ids, ["QR-2024-001", "QR-2024-002", "QR-2024-003"]);
        assert_eq!(reports[2].issues, 0);
        assert_eq!(StaticCatalog.quality_overview()[0].value, "96.4%");

        let perf = StaticCatalog.performance_metrics();
        assert_eq!(perf.len(), 4);
        assert_eq!(perf[1].label, "System Load");
        assert_eq!(perf[1].gauge, Some(34));
    }

    #[test]
    fn result_panels_are_fixed_per_kind() {
        let analysis = StaticCatalog.sample_results(JobKind::Analysis);
        assert_eq!(analysis[1].label, "GC Content");
        assert_eq!(analysis[1].value, "58.3%");
        let compare = StaticCatalog.sample_results(JobKind::Comparison);
        assert_eq!(compare.len(), 6);
        assert_eq!(compare[0].value, "94.7%");
    }
}
