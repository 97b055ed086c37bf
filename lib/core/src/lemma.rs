//! Morphological normalization for tokens.
//!
//! A WordNet-morphy style suffix stripper: irregular forms resolve through an
//! exception table first, then part-of-speech specific detachment rules run
//! most-specific-first. No lemma database ships, so the first rule producing a
//! stem of at least two characters wins instead of a dictionary lookup.

use ahash::AHashMap;

/// Part of speech a surface form is reduced under.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Verb,
}

/// Maps an inflected surface form to its lemma.
///
/// Implementations must be cheap to call per token and safe to share across
/// worker threads.
pub trait Lemmatizer: Send + Sync {
    /// Returns the lemma for `surface` under `pos`, or the surface form
    /// unchanged when no reduction applies.
    fn lemmatize(&self, surface: &str, pos: PartOfSpeech) -> String;
}

/// Passes every surface form through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize(&self, surface: &str, _pos: PartOfSpeech) -> String {
        surface.to_string()
    }
}

/// Candidates shorter than this are rejected and the surface form kept.
const MIN_LEMMA_LEN: usize = 2;

/// Irregular noun forms the detachment rules cannot reach, plus singulars the
/// rules would otherwise mangle (mapped to themselves).
const NOUN_EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("lice", "louse"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("teeth", "tooth"),
    ("calves", "calf"),
    ("elves", "elf"),
    ("halves", "half"),
    ("hooves", "hoof"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("loaves", "loaf"),
    ("scarves", "scarf"),
    ("selves", "self"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("wives", "wife"),
    ("wolves", "wolf"),
    ("analyses", "analysis"),
    ("appendices", "appendix"),
    ("bacteria", "bacterium"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("curricula", "curriculum"),
    ("data", "datum"),
    ("fungi", "fungus"),
    ("hypotheses", "hypothesis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("media", "medium"),
    ("millennia", "millennium"),
    ("nuclei", "nucleus"),
    ("phenomena", "phenomenon"),
    ("radii", "radius"),
    ("stimuli", "stimulus"),
    ("strata", "stratum"),
    ("theses", "thesis"),
    ("vertices", "vertex"),
    ("bonuses", "bonus"),
    ("buses", "bus"),
    ("campuses", "campus"),
    ("choruses", "chorus"),
    ("circuses", "circus"),
    ("gases", "gas"),
    ("lenses", "lens"),
    ("lies", "lie"),
    ("movies", "movie"),
    ("ties", "tie"),
    ("quizzes", "quiz"),
    ("statuses", "status"),
    ("viruses", "virus"),
    ("alias", "alias"),
    ("atlas", "atlas"),
    ("bias", "bias"),
    ("canvas", "canvas"),
    ("clothes", "clothes"),
    ("economics", "economics"),
    ("gas", "gas"),
    ("lens", "lens"),
    ("mathematics", "mathematics"),
    ("news", "news"),
    ("physics", "physics"),
    ("politics", "politics"),
    ("series", "series"),
    ("species", "species"),
    ("abdomen", "abdomen"),
    ("omen", "omen"),
    ("regimen", "regimen"),
    ("specimen", "specimen"),
];

/// Irregular verb forms, plus silent-e stems the bare detachment rules would
/// truncate.
const VERB_EXCEPTIONS: &[(&str, &str)] = &[
    ("ate", "eat"),
    ("became", "become"),
    ("began", "begin"),
    ("begun", "begin"),
    ("born", "bear"),
    ("bought", "buy"),
    ("broke", "break"),
    ("broken", "break"),
    ("brought", "bring"),
    ("built", "build"),
    ("came", "come"),
    ("caught", "catch"),
    ("chose", "choose"),
    ("chosen", "choose"),
    ("drawn", "draw"),
    ("drew", "draw"),
    ("driven", "drive"),
    ("drove", "drive"),
    ("eaten", "eat"),
    ("fallen", "fall"),
    ("fell", "fall"),
    ("felt", "feel"),
    ("flew", "fly"),
    ("flown", "fly"),
    ("found", "find"),
    ("gave", "give"),
    ("given", "give"),
    ("gone", "go"),
    ("got", "get"),
    ("gotten", "get"),
    ("grew", "grow"),
    ("grown", "grow"),
    ("heard", "hear"),
    ("held", "hold"),
    ("kept", "keep"),
    ("knew", "know"),
    ("known", "know"),
    ("led", "lead"),
    ("left", "leave"),
    ("lost", "lose"),
    ("made", "make"),
    ("meant", "mean"),
    ("met", "meet"),
    ("paid", "pay"),
    ("ran", "run"),
    ("said", "say"),
    ("sat", "sit"),
    ("saw", "see"),
    ("seen", "see"),
    ("sent", "send"),
    ("shown", "show"),
    ("sold", "sell"),
    ("sought", "seek"),
    ("spent", "spend"),
    ("spoke", "speak"),
    ("spoken", "speak"),
    ("stood", "stand"),
    ("sung", "sing"),
    ("sang", "sing"),
    ("taken", "take"),
    ("taught", "teach"),
    ("threw", "throw"),
    ("thrown", "throw"),
    ("told", "tell"),
    ("took", "take"),
    ("understood", "understand"),
    ("went", "go"),
    ("won", "win"),
    ("wore", "wear"),
    ("worn", "wear"),
    ("written", "write"),
    ("wrote", "write"),
    ("added", "add"),
    ("adding", "add"),
    ("agreed", "agree"),
    ("based", "base"),
    ("becoming", "become"),
    ("believed", "believe"),
    ("caused", "cause"),
    ("causing", "cause"),
    ("changed", "change"),
    ("changing", "change"),
    ("coming", "come"),
    ("created", "create"),
    ("creating", "create"),
    ("dated", "date"),
    ("described", "describe"),
    ("died", "die"),
    ("dies", "die"),
    ("dying", "die"),
    ("faced", "face"),
    ("freed", "free"),
    ("giving", "give"),
    ("included", "include"),
    ("including", "include"),
    ("increased", "increase"),
    ("introduced", "introduce"),
    ("lied", "lie"),
    ("lies", "lie"),
    ("lived", "live"),
    ("living", "live"),
    ("loved", "love"),
    ("loving", "love"),
    ("lying", "lie"),
    ("making", "make"),
    ("moved", "move"),
    ("moving", "move"),
    ("named", "name"),
    ("naming", "name"),
    ("noted", "note"),
    ("placed", "place"),
    ("produced", "produce"),
    ("producing", "produce"),
    ("provided", "provide"),
    ("providing", "provide"),
    ("raised", "raise"),
    ("received", "receive"),
    ("related", "relate"),
    ("released", "release"),
    ("required", "require"),
    ("saved", "save"),
    ("saving", "save"),
    ("served", "serve"),
    ("serving", "serve"),
    ("shared", "share"),
    ("sharing", "share"),
    ("stored", "store"),
    ("storing", "store"),
    ("taking", "take"),
    ("tied", "tie"),
    ("ties", "tie"),
    ("tying", "tie"),
    ("used", "use"),
    ("using", "use"),
    ("writing", "write"),
];

/// Suffix-stripping lemmatizer over embedded exception tables.
pub struct MorphyLemmatizer {
    noun_exceptions: AHashMap<&'static str, &'static str>,
    verb_exceptions: AHashMap<&'static str, &'static str>,
}

impl MorphyLemmatizer {
    pub fn new() -> Self {
        Self {
            noun_exceptions: NOUN_EXCEPTIONS.iter().copied().collect(),
            verb_exceptions: VERB_EXCEPTIONS.iter().copied().collect(),
        }
    }
}

impl Default for MorphyLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer for MorphyLemmatizer {
    fn lemmatize(&self, surface: &str, pos: PartOfSpeech) -> String {
        let exceptions = match pos {
            PartOfSpeech::Noun => &self.noun_exceptions,
            PartOfSpeech::Verb => &self.verb_exceptions,
        };
        if let Some(lemma) = exceptions.get(surface) {
            return (*lemma).to_string();
        }
        let reduced = match pos {
            PartOfSpeech::Noun => reduce_noun(surface),
            PartOfSpeech::Verb => reduce_verb(surface),
        };
        reduced.unwrap_or_else(|| surface.to_string())
    }
}

fn reduce_noun(surface: &str) -> Option<String> {
    if let Some(stem) = surface.strip_suffix("ies") {
        return accept(format!("{stem}y"));
    }
    if let Some(candidate) = strip_es(surface) {
        return accept(candidate);
    }
    if let Some(stem) = surface.strip_suffix("men") {
        return accept(format!("{stem}man"));
    }
    strip_plain_s(surface)
}

fn reduce_verb(surface: &str) -> Option<String> {
    if let Some(stem) = surface.strip_suffix("ies") {
        return accept(format!("{stem}y"));
    }
    if let Some(stem) = surface.strip_suffix("ied") {
        return accept(format!("{stem}y"));
    }
    if let Some(candidate) = strip_es(surface) {
        return accept(candidate);
    }
    if let Some(stem) = surface.strip_suffix("ing") {
        return accept(undouble(stem));
    }
    if let Some(stem) = surface.strip_suffix("ed") {
        return accept(undouble(stem));
    }
    strip_plain_s(surface)
}

fn accept(candidate: String) -> Option<String> {
    if candidate.len() >= MIN_LEMMA_LEN {
        Some(candidate)
    } else {
        None
    }
}

/// Strips "es" and decides whether the final e belonged to the stem or was
/// inserted by inflection ("cases" keeps its e, "glasses" never had one).
fn strip_es(surface: &str) -> Option<String> {
    let stem = surface.strip_suffix("es")?;
    let sibilant = stem.ends_with("ss")
        || stem.ends_with("sh")
        || stem.ends_with("ch")
        || stem.ends_with("zz")
        || stem.ends_with('x')
        || stem.ends_with('o');
    if sibilant {
        Some(stem.to_string())
    } else {
        Some(format!("{stem}e"))
    }
}

/// Bare "s" detachment. Words ending in ss/us/is are singular far more often
/// than plural ("glass", "virus", "analysis") and are left alone.
fn strip_plain_s(surface: &str) -> Option<String> {
    if surface.ends_with("ss") || surface.ends_with("us") || surface.ends_with("is") {
        return None;
    }
    let stem = surface.strip_suffix('s')?;
    accept(stem.to_string())
}

/// Inflection doubles a final consonant ("stopped", "running"); drop the
/// duplicate unless the letter legitimately doubles word-finally or is a
/// vowel ("falling", "seeing").
fn undouble(stem: &str) -> String {
    let mut candidate = stem.to_string();
    let mut chars = candidate.chars().rev();
    let last = chars.next();
    let prev = chars.next();
    if let (Some(a), Some(b)) = (last, prev) {
        if a == b && !matches!(a, 'a' | 'e' | 'i' | 'o' | 'u' | 'l' | 's' | 'f' | 'z') {
            candidate.pop();
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exceptions_resolve_irregular_forms() {
        let morphy = MorphyLemmatizer::new();
        assert_eq!(morphy.lemmatize("children", PartOfSpeech::Noun), "child");
        assert_eq!(morphy.lemmatize("teeth", PartOfSpeech::Noun), "tooth");
        assert_eq!(morphy.lemmatize("took", PartOfSpeech::Verb), "take");
        assert_eq!(morphy.lemmatize("went", PartOfSpeech::Verb), "go");
    }

    #[test]
    fn noun_detachment_rules() {
        let morphy = MorphyLemmatizer::new();
        assert_eq!(morphy.lemmatize("books", PartOfSpeech::Noun), "book");
        assert_eq!(morphy.lemmatize("glasses", PartOfSpeech::Noun), "glass");
        assert_eq!(morphy.lemmatize("cases", PartOfSpeech::Noun), "case");
        assert_eq!(morphy.lemmatize("studies", PartOfSpeech::Noun), "study");
        assert_eq!(morphy.lemmatize("boxes", PartOfSpeech::Noun), "box");
        assert_eq!(morphy.lemmatize("heroes", PartOfSpeech::Noun), "hero");
        assert_eq!(morphy.lemmatize("women", PartOfSpeech::Noun), "woman");
    }

    #[test]
    fn verb_detachment_rules() {
        let morphy = MorphyLemmatizer::new();
        assert_eq!(morphy.lemmatize("watches", PartOfSpeech::Verb), "watch");
        assert_eq!(morphy.lemmatize("walking", PartOfSpeech::Verb), "walk");
        assert_eq!(morphy.lemmatize("played", PartOfSpeech::Verb), "play");
        assert_eq!(morphy.lemmatize("tried", PartOfSpeech::Verb), "try");
        assert_eq!(morphy.lemmatize("goes", PartOfSpeech::Verb), "go");
    }

    #[test]
    fn doubled_consonants_reduce_once() {
        let morphy = MorphyLemmatizer::new();
        assert_eq!(morphy.lemmatize("running", PartOfSpeech::Verb), "run");
        assert_eq!(morphy.lemmatize("stopped", PartOfSpeech::Verb), "stop");
        // ll, ss and vowel endings are legitimate word-final doubles
        assert_eq!(morphy.lemmatize("falling", PartOfSpeech::Verb), "fall");
        assert_eq!(morphy.lemmatize("passing", PartOfSpeech::Verb), "pass");
        assert_eq!(morphy.lemmatize("seeing", PartOfSpeech::Verb), "see");
    }

    #[test]
    fn singular_lookalikes_survive() {
        let morphy = MorphyLemmatizer::new();
        assert_eq!(morphy.lemmatize("glass", PartOfSpeech::Noun), "glass");
        assert_eq!(morphy.lemmatize("virus", PartOfSpeech::Noun), "virus");
        assert_eq!(morphy.lemmatize("analysis", PartOfSpeech::Noun), "analysis");
        assert_eq!(morphy.lemmatize("us", PartOfSpeech::Noun), "us");
    }

    #[test]
    fn unreducible_forms_pass_through() {
        let morphy = MorphyLemmatizer::new();
        assert_eq!(morphy.lemmatize("sculpture", PartOfSpeech::Noun), "sculpture");
        assert_eq!(morphy.lemmatize("bronze", PartOfSpeech::Noun), "bronze");
    }

    #[test]
    fn identity_lemmatizer_never_rewrites() {
        let identity = IdentityLemmatizer;
        assert_eq!(identity.lemmatize("running", PartOfSpeech::Verb), "running");
    }
}
