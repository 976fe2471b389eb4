//! Index and slice resolution for sequence subscripting.
//!
//! Implements the usual slicing rules: negative indices count from the end,
//! out-of-range slice bounds clamp instead of failing, a negative step walks
//! backwards, and a zero step is rejected.

use crate::error::{Error, Result};

/// Resolve a (possibly negative) index against a sequence length.
pub fn resolve_index(index: i64, len: usize) -> Result<usize> {
    let len = len as i64;
    let adjusted = if index < 0 { index + len } else { index };
    if adjusted < 0 || adjusted >= len {
        Err(Error::Argument(format!("index {index} out of range")))
    } else {
        Ok(adjusted as usize)
    }
}

/// Resolve slice fields against a sequence length, producing the source
/// indices of the selected elements in selection order.
pub fn resolve_slice(
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
    len: usize,
) -> Result<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(Error::Argument("slice step cannot be zero".to_string()));
    }
    let len = len as i64;

    let clamp = |bound: i64, low: i64, high: i64| bound.clamp(low, high);
    let normalize = |bound: i64| if bound < 0 { bound + len } else { bound };

    let mut indices = Vec::new();
    if step > 0 {
        let start = clamp(start.map_or(0, normalize), 0, len);
        let stop = clamp(stop.map_or(len, normalize), 0, len);
        let mut i = start;
        while i < stop {
            indices.push(i as usize);
            i += step;
        }
    } else {
        let start = clamp(start.map_or(len - 1, normalize), -1, len - 1);
        let stop = clamp(stop.map_or(-1, normalize), -1, len - 1);
        let mut i = start;
        while i > stop {
            indices.push(i as usize);
            i += step;
        }
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_count_from_both_ends() {
        assert_eq!(resolve_index(0, 3).unwrap(), 0);
        assert_eq!(resolve_index(-1, 3).unwrap(), 2);
        assert!(resolve_index(3, 3).is_err());
        assert!(resolve_index(-4, 3).is_err());
    }

    #[test]
    fn slices_clamp_and_step() {
        assert_eq!(resolve_slice(Some(1), Some(100), None, 4).unwrap(), vec![1, 2, 3]);
        assert_eq!(resolve_slice(None, None, Some(2), 5).unwrap(), vec![0, 2, 4]);
        assert_eq!(resolve_slice(None, None, Some(-1), 3).unwrap(), vec![2, 1, 0]);
        assert_eq!(resolve_slice(Some(-2), None, None, 4).unwrap(), vec![2, 3]);
        assert!(resolve_slice(None, None, Some(0), 3).is_err());
    }
}
