//! Spreadsheet export of the ranked team sheet and the score history.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::{
    error::ServiceError,
    state::{
        engine::EngineSnapshot,
        stage::StageConfig,
        tabular::{history_sheet_header, history_to_rows, team_sheet_header, teams_to_rows},
    },
};

const TEAM_SHEET: &str = "Skor Tim";
const HISTORY_SHEET: &str = "Riwayat Skor";

/// Workbook with the ranked team sheet and the chronological history sheet.
pub fn export_xlsx(snapshot: &EngineSnapshot, config: &StageConfig) -> Result<Vec<u8>, ServiceError> {
    build_workbook(snapshot, config).map_err(|err| ServiceError::Internal(err.to_string()))
}

/// Ranked team sheet as CSV.
pub fn export_teams_csv(
    snapshot: &EngineSnapshot,
    config: &StageConfig,
) -> Result<Vec<u8>, ServiceError> {
    write_csv(
        &team_sheet_header(config),
        &teams_to_rows(&snapshot.teams, config),
    )
}

/// Score history as CSV, oldest entry first.
pub fn export_history_csv(snapshot: &EngineSnapshot) -> Result<Vec<u8>, ServiceError> {
    write_csv(
        &history_sheet_header(),
        &history_to_rows(&snapshot.ledger, &snapshot.teams),
    )
}

/// Download name for an export of the snapshot's stage.
pub fn file_name(snapshot: &EngineSnapshot, suffix: &str) -> String {
    format!("skor-{}-{suffix}", snapshot.stage)
}

fn build_workbook(snapshot: &EngineSnapshot, config: &StageConfig) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let teams = workbook.add_worksheet().set_name(TEAM_SHEET)?;
    write_sheet(
        teams,
        &team_sheet_header(config),
        &teams_to_rows(&snapshot.teams, config),
        &bold,
    )?;

    let history = workbook.add_worksheet().set_name(HISTORY_SHEET)?;
    write_sheet(
        history,
        &history_sheet_header(),
        &history_to_rows(&snapshot.ledger, &snapshot.teams),
        &bold,
    )?;

    workbook.save_to_buffer()
}

fn write_sheet(
    worksheet: &mut Worksheet,
    header: &[String],
    rows: &[Vec<String>],
    bold: &Format,
) -> Result<(), XlsxError> {
    for (col, title) in header.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, title, bold)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let row_number = index as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            match value.parse::<i64>() {
                Ok(number) => worksheet.write_number(row_number, col as u16, number as f64)?,
                Err(_) => worksheet.write_string(row_number, col as u16, value)?,
            };
        }
    }
    Ok(())
}

fn write_csv(header: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(header)
        .map_err(|err| ServiceError::Internal(err.to_string()))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|err| ServiceError::Internal(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| ServiceError::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        state::engine::{EngineCommand, ScoreboardEngine},
    };

    fn played_final() -> ScoreboardEngine {
        let mut engine = ScoreboardEngine::new(StageConfig::final_stage(), &AppConfig::default());
        for (team_id, category, delta) in [(2, "wajib", 100), (2, "penalti", -25), (5, "lemparan", 50)]
        {
            engine
                .handle(EngineCommand::ApplyScore {
                    team_id,
                    category: category.into(),
                    delta,
                })
                .unwrap();
        }
        engine
    }

    #[test]
    fn teams_csv_is_ranked() {
        let engine = played_final();
        let csv = String::from_utf8(export_teams_csv(&engine.snapshot(), engine.config()).unwrap())
            .unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Peringkat,Tim,Sekolah,Total Skor,Soal Wajib,Soal Lemparan,Soal Rebutan,Penalti,Warna"
        );
        assert!(lines.next().unwrap().starts_with("1,Tim 2,Sekolah 2,75,1,0,0,1,"));
        assert!(lines.next().unwrap().starts_with("2,Tim 5,Sekolah 5,50,0,1,0,0,"));
    }

    #[test]
    fn history_csv_lists_entries_in_order() {
        let engine = played_final();
        let csv = String::from_utf8(export_history_csv(&engine.snapshot()).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Waktu,Tim,Tindakan,Kategori,Poin,Total Baru");
        assert!(lines[2].ends_with(",Tim 2,Kurang Skor,Penalti,-25,75"));
    }

    #[test]
    fn workbook_is_a_zip_container() {
        let engine = played_final();
        let bytes = export_xlsx(&engine.snapshot(), engine.config()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn file_name_mentions_stage() {
        let engine = played_final();
        assert_eq!(file_name(&engine.snapshot(), "tim.csv"), "skor-final-tim.csv");
    }
}
