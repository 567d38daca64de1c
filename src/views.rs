//! Server-side HTML pages.
//!
//! Every value coming from a record or a request goes through [`escape`].

use std::fmt::Write as _;

use time::format_description::well_known::Rfc3339;

use crate::flash::Flash;
use crate::personnes::{dto::FormErrors, dto::PersonForm, repo_types::Person, services::PageInfo, BASE_PATH};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flashes: &[Flash], body: &str) -> String {
    let mut notices = String::new();
    for f in flashes {
        let _ = write!(
            notices,
            r#"<div class="alert alert-{}">{}</div>"#,
            f.kind.as_str(),
            escape(&f.message)
        );
    }
    format!(
        r#"<!doctype html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
</head>
<body>
  <nav class="menu">
    <a href="{base}/all">Toutes</a>
    <a href="{base}/page">Par page</a>
    <a href="{base}/edit">Ajouter</a>
  </nav>
  <h1>{title}</h1>
  {notices}
  {body}
</body>
</html>
"#,
        title = escape(title),
        base = BASE_PATH,
    )
}

fn person_table(persons: &[Person]) -> String {
    if persons.is_empty() {
        return r#"<p class="empty">Aucune personne à afficher.</p>"#.to_string();
    }
    let mut rows = String::new();
    for p in persons {
        let _ = write!(
            rows,
            r#"<tr class="personne" data-id="{id}"><td>{id}</td><td>{firstname}</td><td>{lastname}</td><td>{age}</td><td><a href="{base}/{id}">Détail</a> <a href="{base}/edit/{id}">Modifier</a> <a href="{base}/delete/{id}">Supprimer</a></td></tr>"#,
            id = p.id,
            firstname = escape(&p.firstname),
            lastname = escape(&p.lastname),
            age = p.age,
            base = BASE_PATH,
        );
    }
    format!(
        r#"<table class="personnes"><thead><tr><th>#</th><th>Prénom</th><th>Nom</th><th>Âge</th><th></th></tr></thead><tbody>{rows}</tbody></table>"#
    )
}

/// Pages linked on each side of the current one.
const PAGE_WINDOW: i64 = 2;

/// First page, last page, and the pages around `page`. `None` marks a gap.
fn page_window(page: i64, page_count: i64) -> Vec<Option<i64>> {
    if page_count < 1 {
        return Vec::new();
    }
    let lo = page.saturating_sub(PAGE_WINDOW).max(1);
    let hi = page.saturating_add(PAGE_WINDOW).min(page_count);
    let mut pages = vec![1, page_count];
    if lo <= hi {
        pages.extend(lo..=hi);
    }
    pages.sort_unstable();
    pages.dedup();

    let mut window = Vec::with_capacity(pages.len() * 2);
    let mut previous = 0;
    for n in pages {
        if n > previous + 1 {
            window.push(None);
        }
        window.push(Some(n));
        previous = n;
    }
    window
}

fn pagination(info: &PageInfo) -> String {
    let mut links = String::new();
    if info.page > 1 {
        let _ = write!(
            links,
            r#"<a rel="prev" href="{BASE_PATH}/page/{}/{}">Précédent</a>"#,
            info.page - 1,
            info.per_page
        );
    }
    for slot in page_window(info.page, info.page_count) {
        let Some(n) = slot else {
            links.push_str(r#"<span class="gap">…</span>"#);
            continue;
        };
        if n == info.page {
            let _ = write!(links, r#"<span class="current">{n}</span>"#);
        } else {
            let _ = write!(
                links,
                r#"<a href="{BASE_PATH}/page/{n}/{}">{n}</a>"#,
                info.per_page
            );
        }
    }
    if info.page < info.page_count {
        let _ = write!(
            links,
            r#"<a rel="next" href="{BASE_PATH}/page/{}/{}">Suivant</a>"#,
            info.page + 1,
            info.per_page
        );
    }
    format!(
        r#"<nav class="pagination" data-page="{}" data-page-count="{}">{links}</nav>"#,
        info.page, info.page_count
    )
}

pub fn index_page(flashes: &[Flash], persons: &[Person], page: Option<&PageInfo>) -> String {
    let mut body = person_table(persons);
    if let Some(info) = page {
        body.push_str(&pagination(info));
    }
    layout("Liste des personnes", flashes, &body)
}

pub fn age_page(flashes: &[Flash], persons: &[Person], age_min: i32, age_max: i32) -> String {
    let body = format!(
        r#"<p class="interval">Personnes âgées de {age_min} à {age_max} ans : {count}</p>{table}"#,
        count = persons.len(),
        table = person_table(persons),
    );
    layout("Personnes par âge", flashes, &body)
}

pub fn detail_page(flashes: &[Flash], person: Option<&Person>) -> String {
    let body = match person {
        Some(p) => format!(
            r#"<dl class="personne" data-id="{id}">
  <dt>Prénom</dt><dd>{firstname}</dd>
  <dt>Nom</dt><dd>{lastname}</dd>
  <dt>Âge</dt><dd>{age}</dd>
  <dt>Créée le</dt><dd>{created}</dd>
  <dt>Modifiée le</dt><dd>{updated}</dd>
</dl>
<a href="{base}/edit/{id}">Modifier</a> <a href="{base}/delete/{id}">Supprimer</a>"#,
            id = p.id,
            firstname = escape(&p.firstname),
            lastname = escape(&p.lastname),
            age = p.age,
            created = p.created_at.format(&Rfc3339).unwrap_or_default(),
            updated = p.updated_at.format(&Rfc3339).unwrap_or_default(),
            base = BASE_PATH,
        ),
        None => format!(r#"<a href="{BASE_PATH}/page">Retour à la liste</a>"#),
    };
    layout("Détail", flashes, &body)
}

pub fn form_page(
    flashes: &[Flash],
    title: &str,
    action: &str,
    form: &PersonForm,
    errors: &FormErrors,
) -> String {
    let field = |name: &'static str, label: &str, kind: &str, value: &str| {
        let error = errors
            .get(name)
            .map(|e| format!(r#"<span class="invalid-feedback">{}</span>"#, escape(e)))
            .unwrap_or_default();
        format!(
            r#"<div class="field"><label for="{name}">{label}</label><input type="{kind}" id="{name}" name="{name}" value="{value}">{error}</div>"#,
            value = escape(value),
        )
    };
    let body = format!(
        r#"<form method="post" action="{action}">{firstname}{lastname}{age}<button type="submit">Enregistrer</button></form>"#,
        action = escape(action),
        firstname = field("firstname", "Prénom", "text", &form.firstname),
        lastname = field("lastname", "Nom", "text", &form.lastname),
        age = field("age", "Âge", "number", &form.age),
    );
    layout(title, flashes, &body)
}

pub fn error_page(message: &str) -> String {
    layout(
        "Erreur",
        &[],
        &format!(r#"<p class="error">{}</p>"#, escape(message)),
    )
}
