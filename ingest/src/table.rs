use crate::{family::Family, record::Record};
use std::io::Write;

/// write the header and one row per record
pub fn write_table<W: Write>(
    family: &Family,
    records: &[Record],
    writer: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record(family.header())?;
    for record in records {
        writer.write_record(family.row(record))?;
    }
    writer.flush()?;

    Ok(())
}
