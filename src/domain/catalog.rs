use std::collections::HashMap;

use crate::domain::entities::record::{columns, field, Row};

const EMPLOYMENT_TYPES_URI: &str = "/dk/atira/pure/person/employmenttypes";
const DEFAULT_EMPLOYMENT_OPTIONS: [&str; 4] = ["faculty", "staff", "emeritus", "other"];
const TOP_JOB_TITLES: usize = 10;

/// Suggestion lists offered while filling in affiliations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Most frequent job descriptions, most common first.
    pub top_job_titles: Vec<String>,
    /// Every distinct job description, sorted.
    pub all_job_titles: Vec<String>,
    pub employment_options: Vec<String>,
}

impl Catalog {
    pub fn build(staff: &[Row], classification: Option<&[Vec<String>]>) -> Self {
        let (top_job_titles, all_job_titles) = job_titles(staff);
        let employment_options = classification
            .and_then(employment_options)
            .unwrap_or_else(|| {
                DEFAULT_EMPLOYMENT_OPTIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });
        Self {
            top_job_titles,
            all_job_titles,
            employment_options,
        }
    }
}

fn job_titles(staff: &[Row]) -> (Vec<String>, Vec<String>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in staff {
        let job = field(row, columns::JOB_DESCRIPTION).trim();
        if !job.is_empty() {
            *counts.entry(job).or_default() += 1;
        }
    }

    let mut all: Vec<String> = counts.keys().map(|job| job.to_string()).collect();
    all.sort();

    let mut by_frequency: Vec<(&str, usize)> = counts.into_iter().collect();
    by_frequency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top = by_frequency
        .into_iter()
        .take(TOP_JOB_TITLES)
        .map(|(job, _)| job.to_string())
        .collect();

    (top, all)
}

/// Reads employment types from a classification sheet: the row right after
/// the one mentioning the employment-types URI, minus the "uri" label.
fn employment_options(grid: &[Vec<String>]) -> Option<Vec<String>> {
    let marker = grid
        .iter()
        .position(|row| row.iter().any(|cell| cell.contains(EMPLOYMENT_TYPES_URI)))?;
    let options: Vec<String> = grid
        .get(marker + 1)?
        .iter()
        .filter(|cell| !cell.is_empty() && !cell.eq_ignore_ascii_case("uri"))
        .cloned()
        .collect();
    (!options.is_empty()).then_some(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::record::row_from;

    #[test]
    fn job_titles_ranked_by_frequency() {
        let staff = vec![
            row_from([("JobDescription", "Lecturer")]),
            row_from([("JobDescription", " Professor ")]),
            row_from([("JobDescription", "Lecturer")]),
            row_from([("JobDescription", "")]),
        ];
        let catalog = Catalog::build(&staff, None);
        assert_eq!(catalog.top_job_titles, vec!["Lecturer", "Professor"]);
        assert_eq!(catalog.all_job_titles, vec!["Lecturer", "Professor"]);
        assert_eq!(catalog.employment_options.len(), 4);
    }

    #[test]
    fn employment_options_come_from_classification_sheet() {
        let grid = vec![
            vec!["something".to_string()],
            vec![
                "Employment".to_string(),
                "/dk/atira/pure/person/employmenttypes".to_string(),
            ],
            vec!["URI".to_string(), "academic".to_string(), "support".to_string()],
        ];
        let catalog = Catalog::build(&[], Some(grid.as_slice()));
        assert_eq!(catalog.employment_options, vec!["academic", "support"]);
    }
}
