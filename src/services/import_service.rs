//! CSV parsing for team rosters and the question bank.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
    error::ServiceError,
    state::{questions::QuestionRow, tabular::TeamRow},
};

/// Parse CSV text with a header row into team rows keyed by header.
///
/// Fully blank lines are skipped. Short rows simply lack the trailing columns.
pub fn parse_team_csv(text: &str) -> Result<Vec<TeamRow>, ServiceError> {
    let (headers, records) = read_records(text)?;
    Ok(records
        .iter()
        .map(|record| {
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.to_string(), value.to_string()))
                .collect::<TeamRow>()
        })
        .collect())
}

/// Parse CSV text into question-bank rows.
///
/// Headers are matched case-insensitively in Indonesian or English
/// (`Sesi`/`Session`, `Babak`/`Round`, `Kategori`/`Category`, `Soal`/`Question`,
/// `Jawaban`/`Answer`, `Penjelasan`/`Explanation`).
pub fn parse_question_csv(text: &str) -> Result<Vec<QuestionRow>, ServiceError> {
    let (headers, records) = read_records(text)?;
    let columns: Vec<Option<QuestionColumn>> =
        headers.iter().map(QuestionColumn::from_header).collect();
    if !columns.contains(&Some(QuestionColumn::Question)) {
        return Err(ServiceError::InvalidInput(
            "question bank needs a `Soal` or `Question` column".into(),
        ));
    }

    Ok(records
        .iter()
        .map(|record| {
            let mut row = QuestionRow::default();
            for (column, value) in columns.iter().zip(record.iter()) {
                let value = value.to_string();
                let optional = (!value.is_empty()).then(|| value.clone());
                match column {
                    Some(QuestionColumn::Session) => row.session = optional,
                    Some(QuestionColumn::Round) => row.round = optional,
                    Some(QuestionColumn::Category) => row.category = optional,
                    Some(QuestionColumn::Question) => row.question = value,
                    Some(QuestionColumn::Answer) => row.answer = value,
                    Some(QuestionColumn::Explanation) => row.explanation = optional,
                    None => {}
                }
            }
            row
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuestionColumn {
    Session,
    Round,
    Category,
    Question,
    Answer,
    Explanation,
}

impl QuestionColumn {
    fn from_header(header: &str) -> Option<Self> {
        match header.trim().to_lowercase().as_str() {
            "sesi" | "session" => Some(Self::Session),
            "babak" | "round" => Some(Self::Round),
            "kategori" | "category" => Some(Self::Category),
            "soal" | "pertanyaan" | "question" => Some(Self::Question),
            "jawaban" | "answer" => Some(Self::Answer),
            "penjelasan" | "explanation" => Some(Self::Explanation),
            _ => None,
        }
    }
}

fn read_records(text: &str) -> Result<(StringRecord, Vec<StringRecord>), ServiceError> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| ServiceError::InvalidInput(format!("unreadable CSV header: {err}")))?
        .clone();

    let mut records = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|err| ServiceError::InvalidInput(format!("unreadable CSV row: {err}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        records.push(record);
    }
    Ok((headers, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_csv_keeps_headers_and_skips_blank_lines() {
        let text = "\u{feff}Tim,Sekolah,Warna\nGaruda, SMA 1 ,#112233\n,,\nElang,SMA 2\n";
        let rows = parse_team_csv(text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Tim"], "Garuda");
        assert_eq!(rows[0]["Sekolah"], "SMA 1");
        assert_eq!(rows[0]["Warna"], "#112233");
        assert_eq!(rows[1].get("Warna"), None);
    }

    #[test]
    fn header_only_csv_yields_no_rows() {
        assert!(parse_team_csv("Name,School\n").unwrap().is_empty());
    }

    #[test]
    fn question_csv_maps_indonesian_headers() {
        let text = "Babak,Kategori,Soal,Jawaban,Penjelasan\n\
                    1,Sejarah,Siapa proklamator?,Soekarno-Hatta,\n";
        let rows = parse_question_csv(text).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].round.as_deref(), Some("1"));
        assert_eq!(rows[0].category.as_deref(), Some("Sejarah"));
        assert_eq!(rows[0].answer, "Soekarno-Hatta");
        assert_eq!(rows[0].explanation, None);
    }

    #[test]
    fn question_csv_requires_question_column() {
        assert!(matches!(
            parse_question_csv("Babak,Jawaban\n1,x\n"),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
