//! Built-in session presets and exam catalogue

use examclock_api::{ExamPreset, SessionMode, SessionPreset, SettingsPatch};

/// Session titles whose exam catalogue is shared with another title
const CATALOGUE_ALIASES: &[(&str, &str)] = &[
    ("HSC Examinations", "Trial HSC Examinations"),
    ("Yearly Examinations", "Exit Examinations"),
    ("Preliminary Examinations", "Exit Examinations"),
];

/// Catalogue title that holds the exams for `title`
pub fn catalogue_for(title: &str) -> &str {
    CATALOGUE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == title)
        .map_or(title, |(_, target)| target)
}

fn school_exam(overrides: SettingsPatch) -> SettingsPatch {
    SettingsPatch {
        show_school: Some(true),
        show_crest: Some(true),
        show_status: Some(true),
        grid_layout: Some(3),
        show_times: Some(true),
        ..overrides
    }
}

fn untimed_test() -> SettingsPatch {
    SettingsPatch {
        grid_layout: Some(4),
        disable_timers: Some(true),
        show_times: Some(false),
        show_status: Some(false),
        show_crest: Some(true),
        show_school: Some(true),
        special_provisions: Some(false),
        ..Default::default()
    }
}

fn preset(title: &str, mode: SessionMode, overrides: SettingsPatch) -> SessionPreset {
    SessionPreset {
        title: title.to_string(),
        mode,
        overrides,
    }
}

/// Built-in session presets, examinations first.
///
/// The first preset of each mode is the one selected when switching modes.
pub fn builtin_session_presets() -> Vec<SessionPreset> {
    use SessionMode::{Examinations, Standardised};

    vec![
        preset(
            "Trial HSC Examinations",
            Examinations,
            school_exam(SettingsPatch {
                show_centre: Some(true),
                ..Default::default()
            }),
        ),
        preset(
            "HSC Examinations",
            Examinations,
            SettingsPatch {
                show_centre: Some(true),
                show_crest: Some(false),
                grid_layout: Some(3),
                show_times: Some(true),
                show_school: Some(true),
                ..Default::default()
            },
        ),
        preset("Half Yearly Examinations", Examinations, school_exam(SettingsPatch::default())),
        preset("Exit Examinations", Examinations, school_exam(SettingsPatch::default())),
        preset("Preliminary Examinations", Examinations, school_exam(SettingsPatch::default())),
        preset("Yearly Examinations", Examinations, school_exam(SettingsPatch::default())),
        preset("NAPLAN", Standardised, untimed_test()),
        preset("VALID", Standardised, untimed_test()),
        preset("Check-In Assessment", Standardised, untimed_test()),
        preset("Minimum Standards", Standardised, untimed_test()),
    ]
}

/// (category, name, read_mins, write_hrs, write_mins)
type CatalogueRow = (&'static str, &'static str, u32, u32, u32);

const TRIAL_HSC: &[CatalogueRow] = &[
    ("English", "12 English Standard Paper 1", 10, 1, 30),
    ("English", "12 English Advanced Paper 1", 10, 1, 30),
    ("English", "12 English Standard Paper 2", 5, 2, 0),
    ("English", "12 English Advanced Paper 2", 5, 2, 0),
    ("English", "12 English Extension 1", 10, 2, 0),
    ("Mathematics", "12 Mathematics Standard 1", 10, 2, 0),
    ("Mathematics", "12 Mathematics Standard 2", 10, 2, 30),
    ("Mathematics", "12 Mathematics Advanced", 10, 3, 0),
    ("Mathematics", "12 Mathematics Extension 1", 10, 2, 0),
    ("Mathematics", "12 Mathematics Extension 2", 10, 3, 0),
    ("Science", "12 Chemistry", 5, 3, 0),
    ("Science", "12 Physics", 5, 3, 0),
    ("Science", "12 Biology", 5, 3, 0),
    ("Science", "12 Earth and Environmental Science", 5, 3, 0),
    ("Science", "12 Investigating Science", 5, 3, 0),
    ("Science", "12 Agriculture", 5, 3, 0),
    ("Science", "12 Science Extension", 10, 2, 0),
    ("HSIE", "12 Modern History", 5, 3, 0),
    ("HSIE", "12 Ancient History", 10, 3, 0),
    ("HSIE", "12 History Extension", 10, 2, 0),
    ("HSIE", "12 Legal Studies", 5, 3, 0),
    ("HSIE", "12 Community & Family Studies", 5, 3, 0),
    ("TAS", "12 Work Studies", 10, 1, 0),
    ("TAS", "12 Food Technology", 5, 3, 0),
    ("TAS", "12 Design & Technology", 5, 1, 30),
    ("TAS", "12 Industrial Technology - Metal", 5, 1, 30),
    ("TAS", "12 Industrial Technology - Automotive", 5, 1, 30),
    ("TAS", "12 Construction", 5, 2, 0),
    ("TAS", "Retail Services Examination", 5, 2, 0),
    ("CAPA", "12 Visual Arts", 5, 1, 30),
    ("PDHPE", "12 Personal Development, Health & Physical Education", 5, 3, 0),
    ("PDHPE", "12 Health and Movement Science", 5, 3, 0),
    ("PDHPE", "12 Sport, Lifestyle and Recreation", 5, 2, 0),
    ("PDHPE", "12 Exploring Early Childhood", 5, 2, 0),
    ("Other", "12 Distance Education", 10, 3, 0),
];

/// Built-in exam catalogue
pub fn builtin_exam_presets() -> Vec<ExamPreset> {
    TRIAL_HSC
        .iter()
        .map(|&(category, name, read_mins, write_hrs, write_mins)| ExamPreset {
            catalogue: "Trial HSC Examinations".to_string(),
            category: category.to_string(),
            name: name.to_string(),
            read_mins,
            write_hrs,
            write_mins,
        })
        .collect()
}
