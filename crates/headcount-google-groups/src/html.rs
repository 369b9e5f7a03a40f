//! Login-page markup extraction.
//!
//! Only two things are ever read out of service markup: the first form
//! on the login page and a page title. Extraction stays tolerant of
//! attribute order and surrounding noise; everything else about the
//! pages is ignored.

use scraper::{Html, Selector};

/// The first form on a page, reduced to what the login protocol needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageForm {
    /// The form's `action` attribute, possibly relative, possibly absent.
    pub action: Option<String>,
    pub method: FormMethod,
    /// Every named input in document order, hidden fields included.
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormMethod {
    Get,
    Post,
}

impl PageForm {
    /// Insert or replace a field value, leaving the other inputs
    /// (hidden anti-forgery tokens and the like) untouched.
    pub(crate) fn set_field(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some(field) => field.1 = value.to_owned(),
            None => self.fields.push((name.to_owned(), value.to_owned())),
        }
    }
}

/// Extract the first form on a page, if any.
pub(crate) fn first_form(body: &str) -> Option<PageForm> {
    let document = Html::parse_document(body);
    let form_selector = Selector::parse("form").ok()?;
    let input_selector = Selector::parse("input").ok()?;

    let form = document.select(&form_selector).next()?;
    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .map(str::to_owned);
    let method = match form.value().attr("method") {
        Some(method) if method.eq_ignore_ascii_case("post") => FormMethod::Post,
        _ => FormMethod::Get,
    };

    let mut fields = Vec::new();
    for input in form.select(&input_selector) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        let value = input.value().attr("value").unwrap_or_default();
        fields.push((name.to_owned(), value.to_owned()));
    }

    Some(PageForm {
        action,
        method,
        fields,
    })
}

/// Text of the page's `<title>`, trimmed. `None` when absent or empty.
pub(crate) fn page_title(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?;
    let text = title.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
        <html>
          <head><title> Google Accounts </title></head>
          <body>
            <form method="POST" action="/signin">
              <input type="hidden" name="GALX" value="token123" />
              <input type="text" name="Email" />
              <input type="password" name="Passwd" />
              <input type="submit" value="Sign in" />
            </form>
            <form action="/other"><input name="q" /></form>
          </body>
        </html>
    "#;

    #[test]
    fn test_first_form_extraction() {
        let form = first_form(LOGIN_PAGE).unwrap();

        assert_eq!(form.action.as_deref(), Some("/signin"));
        assert_eq!(form.method, FormMethod::Post);
        assert_eq!(
            form.fields,
            vec![
                ("GALX".to_string(), "token123".to_string()),
                ("Email".to_string(), String::new()),
                ("Passwd".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_set_field_replaces_and_appends() {
        let mut form = first_form(LOGIN_PAGE).unwrap();
        form.set_field("Email", "admin@example.com");
        form.set_field("Extra", "1");

        assert!(form
            .fields
            .contains(&("Email".to_string(), "admin@example.com".to_string())));
        assert!(form.fields.contains(&("Extra".to_string(), "1".to_string())));
        // Hidden token untouched.
        assert!(form
            .fields
            .contains(&("GALX".to_string(), "token123".to_string())));
    }

    #[test]
    fn test_method_defaults_to_get() {
        let form = first_form(r#"<form action="/x"><input name="a" /></form>"#).unwrap();
        assert_eq!(form.method, FormMethod::Get);
    }

    #[test]
    fn test_no_form_yields_none() {
        assert!(first_form("<html><body>nothing here</body></html>").is_none());
    }

    #[test]
    fn test_page_title() {
        assert_eq!(page_title(LOGIN_PAGE).as_deref(), Some("Google Accounts"));
        assert!(page_title("<html><head><title></title></head></html>").is_none());
        assert!(page_title("<html><body>untitled</body></html>").is_none());
    }
}
