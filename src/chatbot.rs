//! The query pipeline: scope filter, ordered routes, lookup handlers.

use gotham_types::{EntityId, EntityKind, QueryResponse, QueryType, Stats};
use tracing::{debug, error, info};

use crate::cache::{Entity, EntityCache};
use crate::compare::Comparator;
use crate::compose::{Choice, Composer, enrichment};
use crate::config::Config;
use crate::error::Result;
use crate::knowledge::AMBIGUOUS_NAMES;
use crate::matcher::{Match, Matcher, mentions, normalize_query};
use crate::relations::Resolver;
use crate::router::{self, Intent, LookupClass, Route, default_routes};
use crate::scope::check_scope;
use crate::store::{EntityRow, Store};

const CANDIDATE_LIMIT: usize = 5;
const DISAMBIGUATION_CONFIDENCE: f64 = 0.5;

pub struct Chatbot {
    store: Store,
    cache: EntityCache,
    composer: Composer,
    config: Config,
    routes: Vec<Route>,
}

impl Chatbot {
    /// Builds the entity cache up front; a store that cannot be read fails here.
    pub fn new(store: Store, config: Config) -> Result<Self> {
        let cache = EntityCache::build(&store)?;
        info!(entities = cache.canonical_len(), "chatbot ready");
        let composer = Composer::new(config.composer.clone(), config.seed);
        Ok(Self {
            store,
            cache,
            composer,
            config,
            routes: default_routes(),
        })
    }

    /// Open `config.database` and build a chatbot over it.
    pub fn open(config: Config) -> Result<Self> {
        let store = Store::open(&config.database)?;
        Self::new(store, config)
    }

    /// Replace the route list. Order is evaluation order.
    pub fn with_routes(mut self, routes: Vec<Route>) -> Self {
        self.routes = routes;
        self
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn stats(&self) -> Result<Stats> {
        self.store.stats()
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.cache)
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store, &self.cache, &self.composer)
    }

    // ── Entry points ─────────────────────────────────────────────────────

    /// Answer one question. Never fails: store errors become an `error`
    /// response.
    pub fn process_query(&self, query: &str) -> QueryResponse {
        let query = query.trim();
        if query.is_empty() {
            return clarification("I need more context. What would you like to know about the Batman universe?");
        }
        if let Some(refusal) = check_scope(query) {
            debug!(term = refusal.term, "out of scope");
            return QueryResponse::new(refusal.message, 0.0, Vec::new(), QueryType::OutOfScope);
        }

        for route in &self.routes {
            let Some(intent) = (route.detect)(query) else {
                continue;
            };
            debug!(route = route.name, ?intent, "route matched");
            match self.dispatch(query, &intent) {
                Ok(Some(response)) => return response,
                Ok(None) => debug!(route = route.name, "no answer, falling through"),
                Err(e) => {
                    error!(route = route.name, error = %e, "query failed");
                    return QueryResponse::new(
                        "I'm sorry, something went wrong while searching the Batman database. Please try again.",
                        0.0,
                        Vec::new(),
                        QueryType::Error,
                    );
                }
            }
        }
        self.not_found(query)
    }

    /// The entity behind the `n`th (1-based) suggestion, by name alone.
    pub fn resolve_by_ordinal(&self, suggestions: &[String], n: usize) -> Option<EntityId> {
        let name = suggestions.get(n.checked_sub(1)?)?;
        self.cache.find_exact(name).map(|e| e.id)
    }

    /// The `n`th choice of an earlier numbered list. Uses the ids the list
    /// was built from when it carries them.
    pub fn resolve_choice(&self, previous: &QueryResponse, n: usize) -> Option<EntityId> {
        let suggestions = previous.suggestions.as_deref().unwrap_or_default();
        if previous.choices.len() == suggestions.len() && !previous.choices.is_empty() {
            return previous.choices.get(n.checked_sub(1)?).copied();
        }
        self.resolve_by_ordinal(suggestions, n)
    }

    /// Answer a reply to a numbered list. Non-numeric replies are treated as
    /// a fresh question.
    pub fn select_option(&self, previous: &QueryResponse, reply: &str) -> QueryResponse {
        let Ok(n) = reply.trim().parse::<usize>() else {
            return self.process_query(reply);
        };
        match self.resolve_choice(previous, n) {
            Some(id) => self.lookup_entity(id),
            None => clarification(&format!(
                "Please choose a number between 1 and {}.",
                previous.suggestions.as_ref().map_or(0, Vec::len)
            )),
        }
    }

    /// Full answer for an exact stored name or alias.
    pub fn lookup_direct(&self, name: &str) -> QueryResponse {
        match self.cache.find_exact(name) {
            Some(entity) => self.lookup_entity(entity.id),
            None => self.not_found(name),
        }
    }

    pub fn lookup_entity(&self, id: EntityId) -> QueryResponse {
        self.answer(id, 1.0, id.kind.lookup_query_type())
            .unwrap_or_else(|| self.not_found(&id.to_string()))
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    fn dispatch(&self, query: &str, intent: &Intent) -> Result<Option<QueryResponse>> {
        let t = &self.config.thresholds;
        match intent {
            Intent::Attribute { attribute, subject } => {
                let Some(entity) = self.resolve(subject, t.relation, &EntityKind::ALL) else {
                    return Ok(None);
                };
                self.resolver().attribute(entity, *attribute)
            }
            Intent::Compare {
                first,
                second,
                dimension,
            } => {
                let (Some(a), Some(b)) = (
                    self.resolve(first, t.comparison, &EntityKind::ALL),
                    self.resolve(second, t.comparison, &EntityKind::ALL),
                ) else {
                    return Ok(None);
                };
                let comparison = Comparator::new(&self.store).compare(a, b, *dimension)?;
                Ok(Some(comparison.into_response(a, b)))
            }
            Intent::Relations { subject, kind } => {
                match self.resolve(subject, t.relation, &[EntityKind::Character]) {
                    Some(entity) => self.resolver().relations(entity, *kind),
                    None => Ok(None),
                }
            }
            Intent::Users { vehicle } => {
                match self.resolve(vehicle, t.relation, &[EntityKind::Vehicle]) {
                    Some(entity) => self.resolver().users(entity),
                    None => Ok(None),
                }
            }
            Intent::Listing { kind, owner } => {
                let owner = match owner {
                    Some(span) => match self.resolve(span, t.relation, &[EntityKind::Character]) {
                        Some(entity) => Some(entity),
                        None => return Ok(None),
                    },
                    None => None,
                };
                self.resolver().listing(*kind, owner, self.config.listing_limit)
            }
            Intent::Lookup(class) => self.lookup(query, *class).map(Some),
        }
    }

    /// Best canonical entity for a captured span.
    fn resolve(&self, span: &str, threshold: u8, kinds: &[EntityKind]) -> Option<&Entity> {
        let m = self.matcher().best_match(span, f64::from(threshold), kinds)?;
        debug!(text = span, matched = %m.canonical_name, score = m.score(), "resolved span");
        self.cache.get(m.entity)
    }

    // ── Lookup handlers ──────────────────────────────────────────────────

    fn lookup(&self, query: &str, class: LookupClass) -> Result<QueryResponse> {
        match class {
            LookupClass::Vehicle => self.vehicle(query),
            LookupClass::Location => self.location(query),
            LookupClass::Relationship => self.relationship(query),
            LookupClass::Sidekick => self.sidekick(query),
            LookupClass::Character => self.character(query),
            LookupClass::General => self.general(query),
        }
    }

    fn character(&self, query: &str) -> Result<QueryResponse> {
        let kinds = [EntityKind::Character];
        let normalized = normalize_query(query);
        let bare_ambiguous = AMBIGUOUS_NAMES.iter().any(|n| mentions(&normalized, n));
        if bare_ambiguous && !self.names_entity_exactly(&normalized) {
            let matches = self.candidates(query, &kinds);
            if matches.len() > 1 {
                return Ok(self.disambiguate(query, &matches));
            }
        }
        if let Some(r) = self.lookup_in(query, &kinds, self.config.thresholds.character) {
            return Ok(r);
        }
        if let Some(r) = self.ambiguous(query, &kinds) {
            return Ok(r);
        }
        self.general(query)
    }

    fn vehicle(&self, query: &str) -> Result<QueryResponse> {
        let kinds = [EntityKind::Vehicle];
        if router::asks_for_owned_vehicle(query) {
            if let Some(owner) = router::vehicle_owner(query) {
                if let Some(r) = self.owned_vehicle(query, &owner)? {
                    return Ok(r);
                }
            }
        }
        if let Some(r) = self.lookup_in(query, &kinds, self.config.thresholds.vehicle) {
            return Ok(r);
        }
        if let Some(r) = self.ambiguous(query, &kinds) {
            return Ok(r);
        }
        self.general(query)
    }

    /// "What does X drive": the character's linked vehicles compete with
    /// vehicles named after them.
    fn owned_vehicle(&self, query: &str, owner: &str) -> Result<Option<QueryResponse>> {
        let t = &self.config.thresholds;
        let linked: Vec<EntityId> = match self.resolve(owner, t.definitive, &[EntityKind::Character]) {
            Some(character) => self
                .store
                .character_vehicles(character.id.id)?
                .into_iter()
                .map(|row| EntityId::new(EntityKind::Vehicle, row.id))
                .collect(),
            None => Vec::new(),
        };
        let found = self.matcher().vehicle_for_character(
            owner,
            query,
            &linked,
            f64::from(t.character_vehicle_floor),
        );
        Ok(found
            .filter(|m| m.confidence > t.character_vehicle)
            .and_then(|m| self.answer(m.entity, m.confidence, QueryType::VehicleLookup)))
    }

    fn location(&self, query: &str) -> Result<QueryResponse> {
        let kinds = [EntityKind::Location];
        if let Some(r) = self.lookup_in(query, &kinds, self.config.thresholds.location) {
            return Ok(r);
        }
        if let Some(r) = self.ambiguous(query, &kinds) {
            return Ok(r);
        }
        self.general(query)
    }

    fn relationship(&self, query: &str) -> Result<QueryResponse> {
        if let Some(intent @ Intent::Relations { .. }) = router::detect_relationship(query) {
            if let Some(r) = self.dispatch(query, &intent)? {
                return Ok(r);
            }
        }
        Ok(QueryResponse::new(
            "I don't have specific relationship information for that query, but I can help with general character information.",
            0.0,
            Vec::new(),
            QueryType::RelationshipQuery,
        ))
    }

    fn sidekick(&self, query: &str) -> Result<QueryResponse> {
        if self.names_entity_exactly(&normalize_query(query)) {
            return self.character(query);
        }
        let robins: Vec<(String, EntityId)> = self
            .matcher()
            .multi_match(
                "robin",
                CANDIDATE_LIMIT,
                f64::from(self.config.thresholds.ambiguous),
                &[EntityKind::Character],
            )
            .into_iter()
            .filter(|m| m.canonical_name.to_lowercase().contains("robin"))
            .map(|m| (m.canonical_name, m.entity))
            .collect();
        if robins.len() < 2 {
            return self.character(query);
        }
        let names: Vec<String> = robins.iter().map(|(name, _)| name.clone()).collect();
        Ok(QueryResponse::new(
            self.composer.sidekicks(&names),
            DISAMBIGUATION_CONFIDENCE,
            Vec::new(),
            QueryType::CharacterLookup,
        )
        .with_choices(robins))
    }

    fn general(&self, query: &str) -> Result<QueryResponse> {
        let t = &self.config.thresholds;
        if let Some(r) = self.lookup_in(query, &EntityKind::ALL, t.general) {
            return Ok(r);
        }
        if let Some(r) = self.ambiguous(query, &EntityKind::ALL) {
            return Ok(r);
        }
        let hit = self
            .matcher()
            .description_search(query, &EntityKind::ALL, 1)
            .into_iter()
            .find(|m| m.confidence >= t.description);
        if let Some(m) = hit {
            debug!(matched = %m.canonical_name, score = m.rank, "description search");
            if let Some(r) = self.answer(m.entity, m.confidence, QueryType::GeneralSearch) {
                return Ok(r);
            }
        }
        Ok(self.not_found(query))
    }

    // ── Shared steps ─────────────────────────────────────────────────────

    /// Definitive answer when the best match clears `gate`.
    fn lookup_in(&self, query: &str, kinds: &[EntityKind], gate: f64) -> Option<QueryResponse> {
        let threshold = f64::from(self.config.thresholds.definitive);
        let m = self.matcher().best_match(query, threshold, kinds)?;
        debug!(matched = %m.canonical_name, confidence = m.confidence, gate, "best match");
        if m.confidence <= gate {
            return None;
        }
        self.answer(m.entity, m.confidence, m.kind().lookup_query_type())
    }

    fn candidates(&self, query: &str, kinds: &[EntityKind]) -> Vec<Match> {
        let threshold = f64::from(self.config.thresholds.ambiguous);
        self.matcher().multi_match(query, CANDIDATE_LIMIT, threshold, kinds)
    }

    /// Loose-threshold fallback: one candidate answers, several ask.
    fn ambiguous(&self, query: &str, kinds: &[EntityKind]) -> Option<QueryResponse> {
        let matches = self.candidates(query, kinds);
        match matches.as_slice() {
            [] => None,
            [only] => self.answer(only.entity, only.confidence, only.kind().lookup_query_type()),
            [top, ..] => {
                let same_kind: Vec<Match> = matches
                    .iter()
                    .filter(|m| m.kind() == top.kind())
                    .cloned()
                    .collect();
                if same_kind.len() >= 2 {
                    Some(self.disambiguate(query, &same_kind))
                } else {
                    Some(self.disambiguate(query, &matches))
                }
            }
        }
    }

    fn disambiguate(&self, query: &str, matches: &[Match]) -> QueryResponse {
        let choices: Vec<Choice> = matches
            .iter()
            .map(|m| Choice {
                name: m.canonical_name.clone(),
                kind: m.kind(),
                confidence: m.confidence,
            })
            .collect();
        let tag = matches
            .first()
            .map_or(QueryType::GeneralSearch, |m| m.kind().lookup_query_type());
        QueryResponse::new(
            self.composer.disambiguation(query, &choices),
            DISAMBIGUATION_CONFIDENCE,
            Vec::new(),
            tag,
        )
        .with_choices(
            choices
                .into_iter()
                .zip(matches)
                .map(|(c, m)| (c.name, m.entity))
                .collect(),
        )
    }

    fn answer(&self, id: EntityId, confidence: f64, query_type: QueryType) -> Option<QueryResponse> {
        let entity = self.cache.get(id)?;
        let row = EntityRow {
            id: entity.id.id,
            name: entity.canonical_name.clone(),
            description: entity.description.clone(),
        };
        let text = self
            .composer
            .describe(id.kind, &row, confidence, &enrichment(&self.store, id));
        Some(QueryResponse::new(text, confidence, vec![entity.id], query_type))
    }

    fn names_entity_exactly(&self, normalized: &str) -> bool {
        EntityKind::ALL
            .iter()
            .any(|kind| self.cache.list(*kind).iter().any(|e| e.folded == normalized))
    }

    fn not_found(&self, query: &str) -> QueryResponse {
        QueryResponse::new(self.composer.not_found(query), 0.0, Vec::new(), QueryType::NotFound)
    }
}

fn clarification(text: &str) -> QueryResponse {
    QueryResponse::new(text, 0.0, Vec::new(), QueryType::ClarificationNeeded)
}
