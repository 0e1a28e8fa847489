use axum::extract::{Form, Path};
use axum::response::Html;
use serde::Deserialize;

use penscore_core::{Ruling, Worksheet};

use crate::web::pages;
use crate::web::session::MaybeUser;

#[derive(Debug, Deserialize)]
pub struct WorksheetForm {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    text: String,
    double_line: Option<String>,
}

impl WorksheetForm {
    fn ruling(&self) -> Ruling {
        match self.double_line.as_deref() {
            Some("on") => Ruling::Double,
            _ => Ruling::Single,
        }
    }
}

pub async fn practice_menu(MaybeUser(user): MaybeUser) -> Html<String> {
    pages::practice_menu(user.as_ref())
}

pub async fn worksheet_page(MaybeUser(user): MaybeUser) -> Html<String> {
    pages::worksheet_form(user.as_ref())
}

pub async fn custom_worksheet(
    MaybeUser(user): MaybeUser,
    Form(form): Form<WorksheetForm>,
) -> Html<String> {
    let sheet = Worksheet::from_text(&form.heading, &form.text, form.ruling());
    pages::worksheet(&sheet, user.as_ref())
}

pub async fn english_az(MaybeUser(user): MaybeUser) -> Html<String> {
    pages::worksheet(&Worksheet::english_az(), user.as_ref())
}

pub async fn cursive(MaybeUser(user): MaybeUser) -> Html<String> {
    pages::worksheet(&Worksheet::cursive(), user.as_ref())
}

pub async fn devanagari_matra(MaybeUser(user): MaybeUser) -> Html<String> {
    pages::worksheet(&Worksheet::devanagari_matra(), user.as_ref())
}

pub async fn shirorekha(MaybeUser(user): MaybeUser) -> Html<String> {
    pages::worksheet(&Worksheet::shirorekha(), user.as_ref())
}

pub async fn full_practice(MaybeUser(user): MaybeUser, Path(text): Path<String>) -> Html<String> {
    pages::worksheet(&Worksheet::full_practice(&text), user.as_ref())
}
