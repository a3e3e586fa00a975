//! Metadata
//!
//! Read-only queries over the header and parameter sections of a model text.
use crate::constants::{END_OF_PARAMETERS_MARKER, MAX_FEATURE_IDX_MARKER, PARAMETERS_MARKER};
use crate::errors::ModelTextError;
use crate::scanner::Scanner;
use crate::utils::parse_number;
use hashbrown::HashMap;

/// Number of features the model was trained on.
///
/// The text stores the 0-based `max_feature_idx`, so the count is one more.
pub fn extract_feature_count(text: &str) -> Result<usize, ModelTextError> {
    let mut scanner = Scanner::new(text);
    let (n, line) = scanner.seek_marker(MAX_FEATURE_IDX_MARKER)?;
    let (_, value) = line.split_once('=').ok_or_else(|| ModelTextError::MalformedHeader {
        marker: MAX_FEATURE_IDX_MARKER.to_string(),
        reason: format!("line {} has no `=`", n),
    })?;
    let max_feature_idx: usize = parse_number(value, None, MAX_FEATURE_IDX_MARKER, n)?;
    Ok(max_feature_idx + 1)
}

/// Training parameters listed between the `parameters` and
/// `end of parameters` lines, as `[key: value]` entries.
pub fn extract_parameters(text: &str) -> Result<HashMap<String, String>, ModelTextError> {
    let mut scanner = Scanner::new(text);
    scanner.seek_marker(PARAMETERS_MARKER)?;

    let mut parameters = HashMap::new();
    while let Some((n, line)) = scanner.next_line() {
        if line.starts_with(END_OF_PARAMETERS_MARKER) {
            return Ok(parameters);
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .strip_prefix('[')
            .and_then(|l| l.strip_suffix(']'))
            .and_then(|l| l.split_once(':'))
            .ok_or_else(|| ModelTextError::MalformedHeader {
                marker: PARAMETERS_MARKER.to_string(),
                reason: format!("line {} is not a `[key: value]` entry", n),
            })?;
        parameters.insert(key.trim().to_string(), value.trim().to_string());
    }
    Err(ModelTextError::MalformedHeader {
        marker: END_OF_PARAMETERS_MARKER.to_string(),
        reason: "marker not found before the end of the text".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        let text = "tree\nversion=v4\nnum_class=1\nmax_feature_idx=41\nobjective=regression\n";
        assert_eq!(extract_feature_count(text).unwrap(), 42);
        assert_eq!(extract_feature_count("max_feature_idx=0\r\n").unwrap(), 1);
    }

    #[test]
    fn test_feature_count_errors() {
        assert!(matches!(
            extract_feature_count("tree\nversion=v4\n").unwrap_err(),
            ModelTextError::MalformedHeader { .. }
        ));
        assert!(matches!(
            extract_feature_count("max_feature_idx\n").unwrap_err(),
            ModelTextError::MalformedHeader { .. }
        ));
        match extract_feature_count("tree\nmax_feature_idx=x\n").unwrap_err() {
            ModelTextError::MalformedNumericToken { tree, line, token, .. } => {
                assert_eq!(tree, None);
                assert_eq!(line, 2);
                assert_eq!(token, "x");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_parameters() {
        let text = "end of trees\n\nparameters:\n[boosting: gbdt]\n[objective: binary]\n\n[learning_rate: 0.1 ]\n[output_model: C:\\models\\lgbm.txt]\n[forcedsplits_filename: ]\nend of parameters\n\npandas_categorical:null\n";
        let p = extract_parameters(text).unwrap();
        assert_eq!(p.len(), 5);
        assert_eq!(p["boosting"], "gbdt");
        assert_eq!(p["objective"], "binary");
        assert_eq!(p["learning_rate"], "0.1");
        assert_eq!(p["output_model"], "C:\\models\\lgbm.txt");
        assert_eq!(p["forcedsplits_filename"], "");
    }

    #[test]
    fn test_parameters_errors() {
        assert!(matches!(
            extract_parameters("tree\nTree=0\n").unwrap_err(),
            ModelTextError::MalformedHeader { ref marker, .. } if marker == "parameters"
        ));
        assert!(matches!(
            extract_parameters("parameters:\n[boosting: gbdt]\n").unwrap_err(),
            ModelTextError::MalformedHeader { ref marker, .. } if marker == "end of parameters"
        ));
        assert!(matches!(
            extract_parameters("parameters:\nboosting: gbdt\nend of parameters\n").unwrap_err(),
            ModelTextError::MalformedHeader { .. }
        ));
        assert!(extract_parameters("parameters:\nend of parameters\n").unwrap().is_empty());
    }
}
