/// Vessels under investigation. They lead every vessel axis, in this order.
pub const PRIORITY_VESSELS: [&str; 2] = ["Roach Robber", "Snapper Snatcher"];

/// Moves the priority vessels to the front and keeps everything else in
/// its original relative order. Absent priority names leave no gap.
pub fn prioritize_vessels<I, S>(names: I) -> Vec<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut slots: Vec<Option<S>> = names.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());

    for priority in PRIORITY_VESSELS {
        let found = slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|name| name.as_ref() == priority));
        if let Some(slot) = found {
            ordered.extend(slot.take());
        }
    }

    ordered.extend(
        slots
            .into_iter()
            .flatten()
            .filter(|name| !PRIORITY_VESSELS.contains(&name.as_ref())),
    );
    ordered
}

/// The row axis shared by heatmaps and trend grids: unique names, sorted,
/// then prioritized. Both views produce the same axis for the same names.
pub fn vessel_axis<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut unique: Vec<String> = names
        .into_iter()
        .map(|name| name.as_ref().to_owned())
        .collect();
    unique.sort();
    unique.dedup();
    prioritize_vessels(unique)
}
