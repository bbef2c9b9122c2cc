//! Search keyword generation for deal rows.
//!
//! Each deal stores a small set of normalized keywords derived from its
//! title, description and category: content words plus synonym expansions
//! from a static table. The search filter matches query tokens against this
//! set in addition to plain substring matches.

const MAX_KEYWORDS: usize = 15;
const MAX_TEXT_KEYWORDS: usize = 8;

/// Spanish stop words excluded from keyword extraction.
const STOP_WORDS: [&str; 101] = [
    "el", "la", "los", "las", "un", "una", "unos", "unas", "y", "o", "pero",
    "si", "no", "que", "cual", "quien", "donde", "cuando", "como", "por",
    "para", "con", "sin", "sobre", "entre", "desde", "hasta", "durante",
    "antes", "despues", "mientras", "aunque", "porque", "pues", "entonces",
    "tambien", "tampoco", "nunca", "siempre", "veces", "mucho", "poco",
    "mas", "menos", "muy", "demasiado", "bien", "mal", "bueno", "malo",
    "grande", "pequeno", "nuevo", "viejo", "mejor", "peor", "primero",
    "ultimo", "solo", "sola", "este", "esta", "estos", "estas", "ese", "esa",
    "esos", "esas", "aquel", "aquella", "aquellos", "aquellas", "mi", "tu",
    "su", "nuestro", "vuestro", "sus", "mis", "tus", "yo", "ella",
    "nosotros", "vosotros", "ellos", "ellas", "me", "te", "lo", "nos", "os",
    "se", "le", "les", "del", "al", "es", "son", "ser", "hay", "ya",
];

/// Synonym expansions, applied by substring containment against the whole
/// normalized text.
const SYNONYMS: [(&str, &[&str]); 30] = [
    ("juguete", &["juguetes", "juego"]),
    ("tv", &["television", "televisor", "pantalla"]),
    ("celular", &["smartphone", "telefono", "movil"]),
    ("pc", &["computadora", "ordenador", "computador"]),
    ("laptop", &["notebook", "portatil", "computadora portatil"]),
    ("auriculares", &["audifonos", "headphones", "cascos"]),
    ("zapatillas", &["tenis", "sneakers", "calzado deportivo"]),
    ("remera", &["camiseta", "polo", "camisa"]),
    ("jeans", &["pantalon", "vaqueros", "denim"]),
    ("smartphone", &["celular", "telefono", "movil"]),
    ("television", &["tv", "televisor", "pantalla"]),
    ("computadora", &["pc", "ordenador", "computador"]),
    ("notebook", &["laptop", "portatil"]),
    ("audifonos", &["auriculares", "headphones"]),
    ("tenis", &["zapatillas", "sneakers"]),
    ("camiseta", &["remera", "polo"]),
    ("pantalon", &["jeans", "vaqueros"]),
    ("libro", &["libros", "lectura"]),
    ("juego", &["juegos", "videojuego"]),
    ("ropa", &["vestimenta", "indumentaria"]),
    ("calzado", &["zapatos", "zapatillas"]),
    ("accesorios", &["complementos", "adornos"]),
    ("deportes", &["fitness", "ejercicio"]),
    ("hogar", &["casa", "vivienda"]),
    ("belleza", &["cosmeticos", "cuidado personal"]),
    ("electronica", &["tecnologia", "gadgets"]),
    ("moda", &["ropa", "vestimenta"]),
    ("tecnologia", &["electronica", "gadgets"]),
    ("entretenimiento", &["diversion", "ocio"]),
    ("fitness", &["deportes", "ejercicio"]),
];

/// Generate the stored keyword set for a deal from its title, description
/// and category label. Content words first, synonym expansions after,
/// deduplicated in encounter order and capped at 15.
#[must_use]
pub fn generate_search_keywords(title: &str, description: &str, category: &str) -> Vec<String> {
    let text = normalize(&format!("{title} {description} {category}"));

    let mut keywords: Vec<String> = Vec::new();
    for word in content_words(&text) {
        push_unique(&mut keywords, word);
    }
    for synonym in synonym_expansions(&text) {
        push_unique(&mut keywords, synonym);
    }

    keywords
}

fn push_unique(keywords: &mut Vec<String>, kw: &str) {
    if keywords.len() < MAX_KEYWORDS && !keywords.iter().any(|k| k == kw) {
        keywords.push(kw.to_string());
    }
}

/// Lower-case, fold accented vowels (and `ñ`) to their plain forms, and
/// replace every non-alphanumeric character with a space.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            c if c.is_ascii_alphanumeric() => c,
            _ => ' ',
        })
        .collect()
}

fn content_words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .filter(|w| !STOP_WORDS.contains(w))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .take(MAX_TEXT_KEYWORDS)
}

fn synonym_expansions(normalized: &str) -> impl Iterator<Item = &'static str> + '_ {
    SYNONYMS
        .iter()
        .filter(move |(key, _)| normalized.contains(key))
        .flat_map(|(_, expansions)| expansions.iter().copied())
}
