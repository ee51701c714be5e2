//! `owl inspect`: list the records of an encrypted log without decrypting.

use std::fs::File;
use std::io::BufReader;

use owl_core::framing::{RecordReader, RecordType, RECORD_HEADER_LEN};
use owl_core::OwlError;

use crate::app::AppContext;
use crate::cli::InspectArgs;
use crate::errors::CliError;
use crate::ui::{badge, print, receipt, simple_table, Badge, Column};

pub fn handle_inspect(ctx: &AppContext, args: &InspectArgs) -> anyhow::Result<()> {
    let ui = ctx.ui();
    let file = File::open(&args.file).map_err(|e| {
        CliError::not_found(
            format!("Cannot open {}: {}", args.file.display(), e),
            "Hint: Pass the path of a .json.log.enc file.",
        )
    })?;

    let mut reader = RecordReader::new(BufReader::new(file));
    reader.read_version()?;

    let mut rows = Vec::new();
    let mut key_records = 0usize;
    let mut entry_records = 0usize;
    let mut truncated_at = None;
    loop {
        let offset = reader.position();
        match reader.next_record() {
            Ok(Some(record)) => {
                match record.kind {
                    RecordType::SymKey => key_records += 1,
                    RecordType::Json => entry_records += 1,
                }
                rows.push(vec![
                    rows.len().to_string(),
                    offset.to_string(),
                    record.kind.to_string(),
                    record.payload.len().to_string(),
                ]);
            }
            Ok(None) => break,
            Err(OwlError::TruncatedRecord { offset, needed }) => {
                truncated_at = Some((offset, needed));
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!(
        "{}",
        simple_table(
            ui,
            &[
                Column::new("#"),
                Column::new("OFFSET"),
                Column::new("TYPE"),
                Column::new("LENGTH"),
            ],
            &rows,
        )
    );

    if let Some((offset, needed)) = truncated_at {
        print(
            ui,
            &badge(
                ui,
                Badge::Warn,
                &format!(
                    "Record at byte {} is truncated ({} bytes missing)",
                    offset, needed
                ),
            ),
        );
    }
    if entry_records > 0 && key_records == 0 {
        print(
            ui,
            &badge(ui, Badge::Err, "Entries present but no key record"),
        );
    }

    print(
        ui,
        &receipt(
            ui,
            Badge::Info,
            &args.file.display().to_string(),
            &[
                ("Records", rows.len().to_string()),
                ("Key records", key_records.to_string()),
                ("Entry records", entry_records.to_string()),
                ("Header bytes", (rows.len() * RECORD_HEADER_LEN).to_string()),
            ],
        ),
    );
    Ok(())
}
