//! Conversion between the team registry and spreadsheet-like rows.

use indexmap::IndexMap;
use rand::Rng;

use crate::{
    dto::format_system_time,
    state::{
        ledger::Ledger,
        stage::{Category, FinalCategory, StageConfig},
        team::{StageFields, Team, TeamId, TeamRegistry},
    },
};

/// One imported row: header name to cell value.
pub type TeamRow = IndexMap<String, String>;

const NAME_HEADERS: [&str; 3] = ["Tim", "Name", "team"];
const SCHOOL_HEADERS: [&str; 2] = ["Sekolah", "School"];
const COLOR_HEADERS: [&str; 2] = ["Warna", "Color"];

/// Header row of the ranked team sheet.
pub fn team_sheet_header(config: &StageConfig) -> Vec<String> {
    let mut header: Vec<String> = ["Peringkat", "Tim", "Sekolah", "Total Skor"]
        .into_iter()
        .map(String::from)
        .collect();
    header.extend(config.categories().into_iter().map(category_column));
    if config.uses_cards() {
        header.push("Warna".into());
    }
    header
}

/// Header row of the chronological history sheet.
pub fn history_sheet_header() -> Vec<String> {
    ["Waktu", "Tim", "Tindakan", "Kategori", "Poin", "Total Baru"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Ranked team rows (without the header), leader first.
pub fn teams_to_rows(registry: &TeamRegistry, config: &StageConfig) -> Vec<Vec<String>> {
    registry
        .ranked()
        .into_iter()
        .enumerate()
        .map(|(rank, team)| {
            let mut row = vec![
                (rank + 1).to_string(),
                team.name.clone(),
                team.school.clone(),
                team.score.to_string(),
            ];
            row.extend(
                config
                    .categories()
                    .into_iter()
                    .map(|category| category_value(&team.fields, category)),
            );
            if config.uses_cards() {
                row.push(team.color.clone());
            }
            row
        })
        .collect()
}

/// History rows (without the header), oldest first.
pub fn history_to_rows(ledger: &Ledger, registry: &TeamRegistry) -> Vec<Vec<String>> {
    ledger
        .entries()
        .iter()
        .map(|entry| {
            vec![
                format_system_time(entry.timestamp),
                team_label(registry, entry.team_id),
                entry.action.label().to_string(),
                entry.category.label(),
                entry.points.to_string(),
                entry.resulting_total.to_string(),
            ]
        })
        .collect()
}

/// Build zero-scored teams from imported rows, ids starting at 1.
///
/// Header aliases are matched exactly; blank cells count as missing. A missing color
/// gets a random one.
pub fn rows_to_teams<R: Rng + ?Sized>(
    rows: &[TeamRow],
    config: &StageConfig,
    rng: &mut R,
) -> Vec<Team> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| Team {
            id: index as TeamId + 1,
            name: cell(row, &NAME_HEADERS).unwrap_or_else(|| format!("Tim {}", index + 1)),
            school: cell(row, &SCHOOL_HEADERS)
                .unwrap_or_else(|| format!("Sekolah {}", index + 1)),
            color: cell(row, &COLOR_HEADERS).unwrap_or_else(|| random_color(rng)),
            score: 0,
            fields: config.empty_fields(),
            history: Vec::new(),
            position: index,
        })
        .collect()
}

fn cell(row: &TeamRow, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(String::from)
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("#{:06x}", rng.random_range(0..=0xFF_FFFFu32))
}

fn category_column(category: Category) -> String {
    match category {
        Category::Final(FinalCategory::Penalti) | Category::Session(_) => category.label(),
        Category::Final(kind) => format!("Soal {}", kind.label()),
    }
}

fn category_value(fields: &StageFields, category: Category) -> String {
    match (fields, category) {
        (StageFields::Semifinal(fields), Category::Session(session)) => fields
            .session(session)
            .map(|value| value.to_string())
            .unwrap_or_default(),
        (StageFields::Final(fields), Category::Final(kind)) => match kind {
            FinalCategory::Wajib => fields.wajib,
            FinalCategory::Lemparan => fields.lemparan,
            FinalCategory::Rebutan => fields.rebutan,
            FinalCategory::Penalti => fields.penalties,
        }
        .to_string(),
        _ => String::new(),
    }
}

fn team_label(registry: &TeamRegistry, team_id: TeamId) -> String {
    registry
        .get(team_id)
        .map(|team| team.name.clone())
        .unwrap_or_else(|| format!("#{team_id}"))
}
