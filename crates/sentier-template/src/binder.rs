use std::collections::HashSet;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::matcher::combine_defaults;
use crate::model::{RouteTemplate, TemplatePart};
use crate::values::{eq_ignore_case, fold_case, RouteValues};

/// Characters escaped inside a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a query key or value.
const QUERY: &AsciiSet = &SEGMENT.add(b'&').add(b'=').add(b'+');

/// Values selected for link generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateValuesResult {
    /// Values that will be written into the path or query string.
    pub accepted_values: RouteValues,
    /// Accepted values plus defaults, as seen by constraints.
    pub combined_values: RouteValues,
}

/// Binds route values into a concrete path for one template.
#[derive(Debug, Clone)]
pub struct TemplateBinder {
    template: Arc<RouteTemplate>,
    defaults: RouteValues,
}

impl TemplateBinder {
    pub fn new(template: Arc<RouteTemplate>, defaults: RouteValues) -> Self {
        let defaults = combine_defaults(&template, defaults);
        Self { template, defaults }
    }

    pub fn template(&self) -> &Arc<RouteTemplate> {
        &self.template
    }

    pub fn defaults(&self) -> &RouteValues {
        &self.defaults
    }

    /// Select the values to generate with.
    ///
    /// Explicit `values` win over `ambient` ones. An ambient value is only
    /// reused for a parameter while no earlier parameter received a new
    /// explicit value. Returns `None` when a required parameter has no value
    /// or an explicit value contradicts a non-parameter default.
    pub fn get_values(
        &self,
        ambient: &RouteValues,
        values: &RouteValues,
    ) -> Option<TemplateValuesResult> {
        let mut accepted = RouteValues::new();
        let mut ambient_usable = true;

        for parameter in self.template.parameters() {
            let name = parameter.name.as_str();
            let ambient_value = ambient.get_non_empty(name);

            match values.get_non_empty(name) {
                Some(explicit) => {
                    if ambient_value.map_or(true, |a| !eq_ignore_case(a, explicit)) {
                        ambient_usable = false;
                    }
                    accepted.insert(name, explicit);
                }
                None if values.contains_key(name) => {
                    // An explicit empty value clears the ambient one.
                    ambient_usable = false;
                }
                None => {
                    if let Some(a) = ambient_value.filter(|_| ambient_usable) {
                        accepted.insert(name, a);
                    }
                }
            }
        }

        for (key, value) in values {
            if value.is_empty() || self.template.parameter(key).is_some() {
                continue;
            }
            match self.defaults.get(key) {
                Some(default) if !eq_ignore_case(default, value) => return None,
                Some(_) => {}
                None => {
                    accepted.insert(key, value);
                }
            }
        }

        for parameter in self.template.parameters() {
            if !accepted.contains_key(&parameter.name)
                && !self.defaults.contains_key(&parameter.name)
                && !parameter.is_optional
                && !parameter.is_catch_all
            {
                return None;
            }
        }

        let mut combined = accepted.clone();
        for (key, value) in &self.defaults {
            if !combined.contains_key(key) {
                combined.insert(key, value);
            }
        }

        Some(TemplateValuesResult {
            accepted_values: accepted,
            combined_values: combined,
        })
    }

    /// Write `accepted` values into the template.
    ///
    /// Trailing segments whose value equals their default, or that are
    /// empty optionals, are left out. Accepted values that are not template
    /// parameters become the query string.
    pub fn bind_values(&self, accepted: &RouteValues) -> Option<String> {
        let mut segments: Vec<(String, bool)> = Vec::new();
        let mut consumed = HashSet::new();

        for segment in self.template.segments() {
            if let Some(parameter) = segment.simple_parameter() {
                consumed.insert(fold_case(&parameter.name));
                let default = self.defaults.get(&parameter.name);
                let value = accepted
                    .get_non_empty(&parameter.name)
                    .or(default.filter(|d| !d.is_empty()));

                match value {
                    Some(value) => {
                        let encoded = if parameter.is_catch_all {
                            value
                                .split('/')
                                .map(|piece| utf8_percent_encode(piece, SEGMENT).to_string())
                                .collect::<Vec<_>>()
                                .join("/")
                        } else {
                            utf8_percent_encode(value, SEGMENT).to_string()
                        };
                        let elidable = default.is_some_and(|d| eq_ignore_case(d, value));
                        segments.push((encoded, elidable));
                    }
                    None if parameter.is_optional || parameter.is_catch_all => {
                        segments.push((String::new(), true));
                    }
                    None => return None,
                }
                continue;
            }

            let mut text = String::new();
            for part in segment.parts() {
                match part {
                    TemplatePart::Literal(literal) => {
                        text.push_str(&utf8_percent_encode(literal, SEGMENT).to_string());
                    }
                    TemplatePart::Parameter(parameter) => {
                        consumed.insert(fold_case(&parameter.name));
                        let value = accepted
                            .get_non_empty(&parameter.name)
                            .or(self.defaults.get_non_empty(&parameter.name))?;
                        text.push_str(&utf8_percent_encode(value, SEGMENT).to_string());
                    }
                }
            }
            segments.push((text, false));
        }

        while segments.last().is_some_and(|(_, elidable)| *elidable) {
            segments.pop();
        }
        if segments.iter().any(|(text, _)| text.is_empty()) {
            return None;
        }

        let mut path = String::from("/");
        path.push_str(
            &segments
                .into_iter()
                .map(|(text, _)| text)
                .collect::<Vec<_>>()
                .join("/"),
        );

        let query: Vec<String> = accepted
            .iter()
            .filter(|(key, value)| {
                !value.is_empty()
                    && !consumed.contains(&fold_case(key))
                    && self
                        .defaults
                        .get(key)
                        .map_or(true, |d| !eq_ignore_case(d, value))
            })
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(key, QUERY),
                    utf8_percent_encode(value, QUERY)
                )
            })
            .collect();

        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }

        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::TemplateMatcher;

    fn binder(text: &str) -> TemplateBinder {
        binder_with_defaults(text, &[])
    }

    fn binder_with_defaults(text: &str, defaults: &[(&str, &str)]) -> TemplateBinder {
        TemplateBinder::new(
            Arc::new(RouteTemplate::parse(text).unwrap()),
            values(defaults),
        )
    }

    fn values(pairs: &[(&str, &str)]) -> RouteValues {
        pairs.iter().copied().collect()
    }

    fn generate(binder: &TemplateBinder, ambient: &[(&str, &str)], explicit: &[(&str, &str)]) -> Option<String> {
        let result = binder.get_values(&values(ambient), &values(explicit))?;
        binder.bind_values(&result.accepted_values)
    }

    #[test]
    fn binds_explicit_values() {
        assert_eq!(
            generate(&binder("api/Products/{id}"), &[], &[("id", "5")]),
            Some("/api/Products/5".to_string())
        );
    }

    #[test]
    fn missing_required_value_fails() {
        assert_eq!(binder("api/Products/{id}").get_values(&RouteValues::new(), &RouteValues::new()), None);
    }

    #[test]
    fn reuses_ambient_values_until_one_changes() {
        let b = binder("{controller}/{action}/{id?}");

        assert_eq!(
            generate(
                &b,
                &[("controller", "Home"), ("action", "Index"), ("id", "3")],
                &[("action", "About")]
            ),
            Some("/Home/About".to_string())
        );
        assert_eq!(
            generate(
                &b,
                &[("controller", "Home"), ("action", "Index"), ("id", "3")],
                &[("action", "Index")]
            ),
            Some("/Home/Index/3".to_string())
        );
    }

    #[test]
    fn explicit_empty_value_clears_ambient() {
        let b = binder("{controller}/{id?}");
        assert_eq!(
            generate(&b, &[("controller", "Home"), ("id", "3")], &[("controller", "Home"), ("id", "")]),
            Some("/Home".to_string())
        );
    }

    #[test]
    fn elides_trailing_defaults() {
        let b = binder("{controller=Home}/{action=Index}/{id?}");
        assert_eq!(generate(&b, &[], &[]), Some("/".to_string()));
        assert_eq!(
            generate(&b, &[], &[("controller", "Products")]),
            Some("/Products".to_string())
        );
        assert_eq!(
            generate(&b, &[], &[("action", "List")]),
            Some("/Home/List".to_string())
        );
    }

    #[test]
    fn contradicting_non_parameter_default_fails() {
        let b = binder_with_defaults("api/Products", &[("controller", "Products")]);
        assert!(b
            .get_values(&RouteValues::new(), &values(&[("controller", "Orders")]))
            .is_none());

        let result = b
            .get_values(&RouteValues::new(), &values(&[("controller", "products")]))
            .unwrap();
        assert!(result.accepted_values.is_empty());
        assert_eq!(result.combined_values.get("controller"), Some("Products"));
    }

    #[test]
    fn extra_values_become_query_string() {
        assert_eq!(
            generate(
                &binder("api/Products/{id}"),
                &[],
                &[("id", "5"), ("sort", "name asc"), ("page", "2")]
            ),
            Some("/api/Products/5?page=2&sort=name%20asc".to_string())
        );
    }

    #[test]
    fn encodes_segment_values() {
        assert_eq!(
            generate(&binder("search/{term}"), &[], &[("term", "a/b c")]),
            Some("/search/a%2Fb%20c".to_string())
        );
    }

    #[test]
    fn catch_all_keeps_separators() {
        assert_eq!(
            generate(&binder("files/{*path}"), &[], &[("path", "a/b c/d")]),
            Some("/files/a/b%20c/d".to_string())
        );
        assert_eq!(generate(&binder("files/{*path}"), &[], &[]), Some("/files".to_string()));
    }

    #[test]
    fn binds_complex_segments() {
        assert_eq!(
            generate(&binder("files/{name}.{ext}"), &[], &[("name", "report"), ("ext", "pdf")]),
            Some("/files/report.pdf".to_string())
        );
        assert_eq!(generate(&binder("files/{name}.{ext}"), &[], &[("name", "report")]), None);
    }

    #[test]
    fn empty_optional_in_the_middle_fails() {
        let b = binder_with_defaults("{a?}/{b}", &[]);
        assert_eq!(generate(&b, &[], &[("b", "x")]), None);
    }

    #[test]
    fn generated_path_matches_back() {
        let template = Arc::new(RouteTemplate::parse("shop/{category}/{id:int}").unwrap());
        let binder = TemplateBinder::new(Arc::clone(&template), RouteValues::new());
        let matcher = TemplateMatcher::new(template, RouteValues::new());

        let input = values(&[("category", "garden tools"), ("id", "42")]);
        let result = binder.get_values(&RouteValues::new(), &input).unwrap();
        let path = binder.bind_values(&result.accepted_values).unwrap();

        assert_eq!(matcher.match_path(&path), Some(result.accepted_values));
    }
}
