//! Client-side mirrors of the backend's field rules, checked before any write so
//! the user gets a precise message instead of a rejected request.
//! Lengths are counted in chars (Unicode scalar values) after trimming.

use std::ops::RangeInclusive;

use crate::error::{AppError, AppResult};
use crate::model::{ArticleDraft, ManualDraft, NoteDraft, QuestionDraft, SectionDraft};

pub const MANUAL_TITLE: RangeInclusive<usize> = 3..=120;
pub const MANUAL_DESCRIPTION_MAX: usize = 2000;
pub const SECTION_TITLE: RangeInclusive<usize> = 1..=120;
pub const ARTICLE_TITLE: RangeInclusive<usize> = 1..=160;
pub const ARTICLE_BODY: RangeInclusive<usize> = 1..=50_000;
pub const POSITION: RangeInclusive<i32> = 0..=9999;
pub const QUESTION_PROMPT: RangeInclusive<usize> = 5..=500;
pub const QUESTION_OPTIONS: RangeInclusive<usize> = 2..=6;
pub const QUESTION_OPTION_TEXT: RangeInclusive<usize> = 1..=200;
pub const NOTE_BODY: RangeInclusive<usize> = 1..=1000;

fn text_len(field: &str, value: &str, range: &RangeInclusive<usize>) -> AppResult<()> {
    let n = value.trim().chars().count();
    if n < *range.start() {
        return Err(AppError::UserInput {
            code: format!("{}_too_short", field),
            message: format!("{} must be at least {} characters", field, range.start()),
        });
    }
    if n > *range.end() {
        return Err(AppError::UserInput {
            code: format!("{}_too_long", field),
            message: format!("{} must be at most {} characters", field, range.end()),
        });
    }
    Ok(())
}

fn position(value: i32) -> AppResult<()> {
    if POSITION.contains(&value) { return Ok(()); }
    Err(AppError::UserInput {
        code: "position_out_of_range".into(),
        message: format!("position must be between {} and {}", POSITION.start(), POSITION.end()),
    })
}

pub fn manual(d: &ManualDraft) -> AppResult<()> {
    text_len("title", &d.title, &MANUAL_TITLE)?;
    if let Some(desc) = d.description.as_deref() {
        text_len("description", desc, &(0..=MANUAL_DESCRIPTION_MAX))?;
    }
    Ok(())
}

pub fn section(d: &SectionDraft) -> AppResult<()> {
    text_len("title", &d.title, &SECTION_TITLE)?;
    position(d.position)
}

pub fn article(d: &ArticleDraft) -> AppResult<()> {
    text_len("title", &d.title, &ARTICLE_TITLE)?;
    text_len("body", &d.body, &ARTICLE_BODY)?;
    position(d.position)
}

pub fn question(d: &QuestionDraft) -> AppResult<()> {
    text_len("prompt", &d.prompt, &QUESTION_PROMPT)?;
    if !QUESTION_OPTIONS.contains(&d.options.len()) {
        return Err(AppError::UserInput {
            code: "options_count".into(),
            message: format!("a question needs between {} and {} options", QUESTION_OPTIONS.start(), QUESTION_OPTIONS.end()),
        });
    }
    for opt in &d.options {
        text_len("option", opt, &QUESTION_OPTION_TEXT)?;
    }
    if d.correct_index >= d.options.len() {
        return Err(AppError::user("correct_index_out_of_range", "correct answer must be one of the options"));
    }
    Ok(())
}

pub fn note(d: &NoteDraft) -> AppResult<()> {
    text_len("body", &d.body, &NOTE_BODY)
}
