use classmap_core::{Error, Result};

/// Pairs the column lists of several properties with their value lists,
/// flattens both, and keeps only the pairs `keep` accepts.
///
/// Every property contributes a group of columns and a group of values of
/// the same length. A length mismatch means the preparer expanded a value
/// wrongly and is an internal error.
pub fn zip_filter_flatten<A, B>(
    names: Vec<Vec<A>>,
    values: Vec<Vec<B>>,
    mut keep: impl FnMut(&A) -> bool,
) -> Result<(Vec<A>, Vec<B>)> {
    if names.len() != values.len() {
        return Err(Error::internal(format!(
            "{} column groups but {} value groups",
            names.len(),
            values.len()
        )));
    }

    let mut kept_names = vec![];
    let mut kept_values = vec![];

    for (group, (names, values)) in names.into_iter().zip(values).enumerate() {
        if names.len() != values.len() {
            return Err(Error::internal(format!(
                "group {group} has {} columns but {} values",
                names.len(),
                values.len()
            )));
        }

        for (name, value) in names.into_iter().zip(values) {
            if keep(&name) {
                kept_names.push(name);
                kept_values.push(value);
            }
        }
    }

    Ok((kept_names, kept_values))
}
