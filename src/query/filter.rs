use url::form_urlencoded;

use crate::config::TableNames;

/// Filterable card fields, declared in evaluation order.
///
/// The declaration order is the order in which predicates and link parameters are
/// emitted, so a given set of filters always produces the same SQL and URL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    CardName,
    CardLevel,
    Archetype,
    Attribute,
    CardType,
    Race,
    Linkval,
    Linkmarkers,
    CardScale,
    Atk,
    Def,
}

const FIELD_COUNT: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchKind {
    ExactInt,
    ExactText,
    NameOrDescription,
    Contains,
    Prefix,
}

impl FilterField {
    pub const ALL: [FilterField; FIELD_COUNT] = [
        FilterField::CardName,
        FilterField::CardLevel,
        FilterField::Archetype,
        FilterField::Attribute,
        FilterField::CardType,
        FilterField::Race,
        FilterField::Linkval,
        FilterField::Linkmarkers,
        FilterField::CardScale,
        FilterField::Atk,
        FilterField::Def,
    ];

    /// Query-string parameter name.
    pub fn param(self) -> &'static str {
        match self {
            FilterField::CardName => "card_name",
            FilterField::CardLevel => "card_level",
            FilterField::Archetype => "archetype",
            FilterField::Attribute => "attribute",
            FilterField::CardType => "card_type",
            FilterField::Race => "race",
            FilterField::Linkval => "linkval",
            FilterField::Linkmarkers => "linkmarkers",
            FilterField::CardScale => "card_scale",
            FilterField::Atk => "atk",
            FilterField::Def => "def",
        }
    }

    /// Column in the card table.
    pub fn column(self) -> &'static str {
        match self {
            FilterField::Attribute => "attr",
            other => other.param(),
        }
    }

    pub fn from_param(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.param() == name)
    }

    fn kind(self) -> MatchKind {
        match self {
            FilterField::CardLevel
            | FilterField::Linkval
            | FilterField::CardScale
            | FilterField::Atk
            | FilterField::Def => MatchKind::ExactInt,
            FilterField::CardType => MatchKind::ExactText,
            FilterField::CardName => MatchKind::NameOrDescription,
            FilterField::Linkmarkers => MatchKind::Contains,
            FilterField::Archetype | FilterField::Attribute | FilterField::Race => MatchKind::Prefix,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Raw filter values for one request, one optional slot per [`FilterField`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    values: [Option<String>; FIELD_COUNT],
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        self.values[field.index()] = Some(value.into());
    }

    /// Build from decoded query pairs. Unknown keys are ignored; a repeated key keeps
    /// its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut spec = Self::default();
        for (key, value) in pairs {
            if let Some(field) = FilterField::from_param(key.as_ref()) {
                spec.set(field, value);
            }
        }
        spec
    }

    /// The value for `field`, trimmed; `None` when unset or blank.
    pub fn value(&self, field: FilterField) -> Option<&str> {
        self.values[field.index()]
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// True when no field contributes a clause to [`build`]. Values that normalize
    /// away (`card_name=''`, `linkmarkers=,`) count as unset, so an empty spec
    /// always yields both an empty predicate and an empty link fragment.
    pub fn is_empty(&self) -> bool {
        FilterField::ALL.iter().all(|field| {
            self.value(*field)
                .and_then(|raw| clause_for(*field, raw, 1))
                .is_none()
        })
    }
}

/// A value bound to a `$n` placeholder, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int(i32),
    BigInt(i64),
    Text(String),
    TextArray(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementMode {
    Count,
    List { limit: i64, offset: i64 },
}

/// SQL statement, its bound parameters and the link fragment describing the same
/// filters. Built per request and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub sql: String,
    /// WHERE-clause body; empty when no filter applies.
    pub predicate: String,
    pub params: Vec<BindValue>,
    /// `key=value` pairs joined by `&`, without a leading `&` or `?`.
    pub url_fragment: String,
}

impl QueryPlan {
    /// Prefix for pagination links under `path`, ready to take `page=..`.
    pub fn link_base(&self, path: &str) -> String {
        link_base(path, &self.url_fragment)
    }
}

/// `path?` or `path?fragment&`, the prefix pagination links are appended to.
pub fn link_base(path: &str, url_fragment: &str) -> String {
    if url_fragment.is_empty() {
        format!("{}?", path)
    } else {
        format!("{}?{}&", path, url_fragment)
    }
}

/// Compose the statement for `spec`.
///
/// Every caller-supplied value is bound; the SQL text only ever contains column
/// names, configured table names and `$n` placeholders.
pub fn build(spec: &FilterSpec, tables: &TableNames, mode: StatementMode) -> QueryPlan {
    let mut predicate = String::new();
    let mut url_fragment = String::new();
    let mut params = Vec::new();

    for field in FilterField::ALL {
        let Some(raw) = spec.value(field) else {
            continue;
        };
        let Some((clause, value)) = clause_for(field, raw, params.len() + 1) else {
            continue;
        };

        if !params.is_empty() {
            predicate.push_str(" AND ");
            url_fragment.push('&');
        }
        predicate.push_str(&clause);
        params.push(value);

        url_fragment.push_str(field.param());
        url_fragment.push('=');
        url_fragment.extend(form_urlencoded::byte_serialize(raw.as_bytes()));
    }

    let sql = match mode {
        StatementMode::Count => format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            tables.cards,
            where_body(&predicate)
        ),
        StatementMode::List { limit, offset } => {
            params.push(BindValue::BigInt(limit));
            let limit_slot = params.len();
            params.push(BindValue::BigInt(offset));
            let offset_slot = params.len();
            card_select(tables, where_body(&predicate), Some((limit_slot, offset_slot)))
        }
    };

    QueryPlan {
        sql,
        predicate,
        params,
        url_fragment,
    }
}

/// Single-card lookup: the list statement restricted to one primary key.
pub fn build_by_id(tables: &TableNames, id: i32) -> QueryPlan {
    let predicate = "id = $1".to_string();
    QueryPlan {
        sql: card_select(tables, &predicate, None),
        predicate,
        params: vec![BindValue::Int(id)],
        url_fragment: String::new(),
    }
}

fn where_body(predicate: &str) -> &str {
    if predicate.is_empty() {
        "TRUE"
    } else {
        predicate
    }
}

fn card_select(tables: &TableNames, predicate: &str, paging: Option<(usize, usize)>) -> String {
    let window = match paging {
        Some((limit, offset)) => format!(" ORDER BY id LIMIT ${} OFFSET ${}", limit, offset),
        None => String::new(),
    };

    format!(
        "SELECT base.*, images.image_url, images.image_url_small \
         FROM (SELECT * FROM {cards} WHERE {predicate}{window}) AS base, \
         LATERAL ( \
             SELECT array_agg(ci.image_url ORDER BY ci.id)::text AS image_url, \
                    array_agg(ci.image_url_small ORDER BY ci.id)::text AS image_url_small \
             FROM {images} ci \
             WHERE ci.card_id = base.id \
         ) AS images \
         ORDER BY base.id",
        cards = tables.cards,
        images = tables.images,
        predicate = predicate,
        window = window,
    )
}

fn clause_for(field: FilterField, raw: &str, slot: usize) -> Option<(String, BindValue)> {
    let column = field.column();
    match field.kind() {
        MatchKind::ExactInt => Some(match raw.parse::<i32>() {
            Ok(number) => (format!("{} = ${}", column, slot), BindValue::Int(number)),
            // Not a number: compare text so the statement stays valid and matches nothing.
            Err(_) => (
                format!("{}::text = ${}", column, slot),
                BindValue::Text(raw.to_string()),
            ),
        }),
        MatchKind::ExactText => Some((
            format!("{} = ${}", column, slot),
            BindValue::Text(raw.to_string()),
        )),
        MatchKind::NameOrDescription => {
            let term: String = raw.chars().filter(|c| *c != '\'' && *c != '"').collect();
            let term = term.trim();
            if term.is_empty() {
                return None;
            }
            Some((
                format!("({} ILIKE ${slot} OR description ILIKE ${slot})", column, slot = slot),
                BindValue::Text(prefix_pattern(term)),
            ))
        }
        MatchKind::Contains => {
            let markers = split_markers(raw);
            if markers.is_empty() {
                return None;
            }
            Some((
                format!("{} @> ${}::text[]", column, slot),
                BindValue::TextArray(markers),
            ))
        }
        MatchKind::Prefix => Some((
            format!("{} ILIKE ${}", column, slot),
            BindValue::Text(prefix_pattern(raw)),
        )),
    }
}

fn prefix_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 1);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn split_markers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|marker| marker.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|marker| !marker.is_empty())
        .map(str::to_string)
        .collect()
}
