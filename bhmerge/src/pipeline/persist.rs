use crate::catalog::ParticleCatalog;
use crate::logs::MergerEvent;
use crate::store::{ArrayStore, Column, StoreError, events_key, redshift_key};

pub const EVENT_FIELDS: [&str; 5] = [
    "times",
    "ids_primary",
    "ids_secondary",
    "masses_primary",
    "masses_secondary",
];

pub fn save_events<S: ArrayStore + ?Sized>(
    store: &S,
    region: &str,
    events: &[MergerEvent],
) -> Result<(), StoreError> {
    let floats = |f: fn(&MergerEvent) -> f64| Column::Float(events.iter().map(f).collect());
    let ints = |f: fn(&MergerEvent) -> i64| Column::Int(events.iter().map(f).collect());
    let cols = [
        ints(|e| e.primary_id),
        ints(|e| e.secondary_id),
        floats(|e| e.primary_mass),
        floats(|e| e.secondary_mass),
    ];
    for (field, col) in EVENT_FIELDS[1..].iter().zip(&cols) {
        store.save(&format!("{field}_{region}"), col)?;
    }
    // times last: its presence marks the region as done
    store.save(&events_key(region), &floats(|e| e.time))
}

pub fn load_events<S: ArrayStore + ?Sized>(
    store: &S,
    region: &str,
) -> Result<Vec<MergerEvent>, StoreError> {
    let floats = |field: &str| -> Result<Vec<f64>, StoreError> {
        let key = format!("{field}_{region}");
        store.load(&key)?.into_floats(&key)
    };
    let ints = |field: &str| -> Result<Vec<i64>, StoreError> {
        let key = format!("{field}_{region}");
        store.load(&key)?.into_ints(&key)
    };
    let times = floats("times")?;
    let ids_primary = ints("ids_primary")?;
    let ids_secondary = ints("ids_secondary")?;
    let masses_primary = floats("masses_primary")?;
    let masses_secondary = floats("masses_secondary")?;

    let n = times.len();
    let lens = [
        ids_primary.len(),
        ids_secondary.len(),
        masses_primary.len(),
        masses_secondary.len(),
    ];
    if lens.iter().any(|&len| len != n) {
        return Err(StoreError::Shape {
            key: events_key(region),
            detail: "event columns disagree in length".to_string(),
        });
    }

    Ok((0..n)
        .map(|i| MergerEvent {
            time: times[i],
            primary_id: ids_primary[i],
            secondary_id: ids_secondary[i],
            primary_mass: masses_primary[i],
            secondary_mass: masses_secondary[i],
        })
        .collect())
}

pub fn save_catalog<S: ArrayStore + ?Sized>(
    store: &S,
    region: &str,
    redshift: f64,
    catalog: &ParticleCatalog,
) -> Result<(), StoreError> {
    let z = redshift_key(redshift);
    // ids go last so an interrupted write is not mistaken for finished output
    let mut cols = catalog.columns();
    cols.rotate_left(1);
    for (field, col) in &cols {
        store.save(&format!("{field}_{region}_{z}"), col)?;
    }
    Ok(())
}
