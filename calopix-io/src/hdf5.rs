//! HDF5 event I/O.
//!
//! Layout: one group per hit collection holding flat `x`, `y`, `z` and
//! `energy` datasets (`f64`, one entry per hit) and a `hits_per_event`
//! dataset (`u64`, one entry per event).

use crate::event::EventData;
use crate::{Error, Result};
use hdf5::types::H5Type;
use hdf5::{File, Group};
use ndarray::ArrayView1;
use std::path::Path;

/// Reads the events of `collection` from an HDF5 file.
///
/// If the file holds a single group under another name, that group is used.
///
/// # Errors
/// Returns an error if the file or a dataset cannot be read, or if the
/// arrays are inconsistent.
pub fn read_events_hdf5<P: AsRef<Path>>(path: P, collection: &str) -> Result<EventData> {
    let file = File::open(path)?;
    let (name, group) = match file.group(collection) {
        Ok(group) => (collection.to_string(), group),
        Err(_) => {
            let names = file.member_names()?;
            match names.as_slice() {
                [only] => (only.clone(), file.group(only)?),
                _ => {
                    return Err(Error::InvalidFormat(format!(
                        "no `{collection}` group (found: {})",
                        names.join(", ")
                    )))
                }
            }
        }
    };

    let counts = read_dataset_vec::<u64>(&group, "hits_per_event")?
        .into_iter()
        .map(|count| {
            usize::try_from(count)
                .map_err(|_| Error::InvalidFormat(format!("hit count {count} overflows usize")))
        })
        .collect::<Result<Vec<_>>>()?;

    EventData::from_flat(
        name,
        read_dataset_vec::<f64>(&group, "x")?,
        read_dataset_vec::<f64>(&group, "y")?,
        read_dataset_vec::<f64>(&group, "z")?,
        read_dataset_vec::<f64>(&group, "energy")?,
        &counts,
    )
}

/// Writes `data` to a new HDF5 file in the layout read by [`read_events_hdf5`].
///
/// # Errors
/// Returns an error if the file or a dataset cannot be created.
pub fn write_events_hdf5<P: AsRef<Path>>(path: P, data: &EventData) -> Result<()> {
    let file = File::create(path)?;
    let group = file.create_group(data.collection())?;

    let mut x = Vec::with_capacity(data.total_hits());
    let mut y = Vec::with_capacity(data.total_hits());
    let mut z = Vec::with_capacity(data.total_hits());
    for index in 0..data.num_events() {
        for p in data.event(index)?.positions() {
            x.push(p.x);
            y.push(p.y);
            z.push(p.z);
        }
    }
    let counts: Vec<u64> = data
        .hits_per_event()
        .into_iter()
        .map(|count| count as u64)
        .collect();

    write_dataset(&group, "x", &x)?;
    write_dataset(&group, "y", &y)?;
    write_dataset(&group, "z", &z)?;
    write_dataset(&group, "energy", data.all_energies())?;
    write_dataset(&group, "hits_per_event", &counts)?;
    Ok(())
}

fn write_dataset<T: H5Type>(group: &Group, name: &str, values: &[T]) -> Result<()> {
    let dataset = group.new_dataset::<T>().shape((values.len(),)).create(name)?;
    if !values.is_empty() {
        dataset.write(ArrayView1::from(values))?;
    }
    Ok(())
}

fn read_dataset_vec<T: H5Type>(group: &Group, name: &str) -> Result<Vec<T>> {
    let dataset = group.dataset(name)?;
    Ok(dataset.read_raw::<T>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_hdf5_event_roundtrip() {
        let data = EventData::from_flat(
            "ECalBarrelCollection",
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
            vec![0.001, 0.002, 0.003],
            &[2, 0, 1],
        )
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        write_events_hdf5(file.path(), &data).unwrap();
        let read = read_events_hdf5(file.path(), "ECalBarrelCollection").unwrap();
        assert_eq!(read, data);

        // A lone group is found under any name.
        let fallback = read_events_hdf5(file.path(), "HCal").unwrap();
        assert_eq!(fallback.hits_per_event(), vec![2, 0, 1]);
    }
}
