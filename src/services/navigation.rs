use crate::models::SheetCursor;

/// Cursor over `sheet_names` positioned at `requested`, or at the first
/// sheet when `requested` is absent or unknown. `None` for an empty list.
pub fn build_navigation(sheet_names: &[String], requested: Option<&str>) -> Option<SheetCursor> {
    let first = sheet_names.first()?;

    let current_index = requested
        .and_then(|name| sheet_names.iter().position(|s| s == name))
        .unwrap_or(0);
    let current = sheet_names.get(current_index).unwrap_or(first);

    let previous = current_index
        .checked_sub(1)
        .and_then(|idx| sheet_names.get(idx))
        .cloned();
    let next = sheet_names.get(current_index + 1).cloned();

    Some(SheetCursor {
        current: current.clone(),
        available: sheet_names.to_vec(),
        previous,
        next,
    })
}
