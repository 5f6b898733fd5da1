//! Token model and keyword vocabulary
//!
//! Every non-whitespace byte run in a `.r4` source file maps to exactly one
//! token. Unknown characters become [`TokenKind::Unknown`] tokens instead of
//! aborting the scan; the parser decides what to do with them.
//!
//! The keyword table is a fixed, insertion-ordered list. Lookup is a
//! case-sensitive exact match: `kind_of("define")` is [`TokenKind::Define`],
//! `kind_of("Define")` is [`TokenKind::Ident`].

/// Maximum stored lexeme length. Longer lexemes are truncated at a char
/// boundary when the token is constructed.
pub const MAX_LEXEME_LEN: usize = 128;

/// The closed set of token kinds: punctuation, literal categories, structural
/// keywords, and the feature-keyword block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literal categories
    Ident,
    Number,
    Str,
    Unknown,
    Eof,

    // Punctuation
    Assign,
    Semi,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    // Structural keywords
    Define,
    Func,
    Print,
    Class,
    Extends,
    Public,
    Private,
    Protected,
    New,
    Super,
    This,
    Inherit,
    Eval,

    // Feature keywords. Recognized and parsed, but they lower to a
    // pass-through annotation only (no code generation semantics).
    Raytracing,
    Vectorize,
    Shading,
    Tracking,
    Rendering,
    Stacking,
    Layering,
    ParticlePhysics,
    Sculpting,
    Texturing,
    Rigging,
    Smoke,
    Streaming,
    Lighting,
    Transitions,
    Motion,
    Aging,
    Morphing,
    CollisionDetection,
    Matrix,
    Optics,
    Zoom,
    Voice,
    Music,
    Cad,
    Blueprinting,
    WorldBuilding,
    Encryption,
    Decryption,
    Conversions,
    Sectioning,
    Warping,
    Blurring,
    Sharpening,
    Coordinates,
    Reasoning,
}

/// The keyword table, in insertion order: structural keywords first, then the
/// feature block. Every entry maps an exact lexeme to its kind.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("define", TokenKind::Define),
    ("func", TokenKind::Func),
    ("print", TokenKind::Print),
    ("class", TokenKind::Class),
    ("extends", TokenKind::Extends),
    ("public", TokenKind::Public),
    ("private", TokenKind::Private),
    ("protected", TokenKind::Protected),
    ("new", TokenKind::New),
    ("super", TokenKind::Super),
    ("this", TokenKind::This),
    ("inherit", TokenKind::Inherit),
    ("eval", TokenKind::Eval),
    ("raytracing", TokenKind::Raytracing),
    ("vectorize", TokenKind::Vectorize),
    ("shading", TokenKind::Shading),
    ("tracking", TokenKind::Tracking),
    ("rendering", TokenKind::Rendering),
    ("stacking", TokenKind::Stacking),
    ("layering", TokenKind::Layering),
    ("particle_physics", TokenKind::ParticlePhysics),
    ("sculpting", TokenKind::Sculpting),
    ("texturing", TokenKind::Texturing),
    ("rigging", TokenKind::Rigging),
    ("smoke", TokenKind::Smoke),
    ("streaming", TokenKind::Streaming),
    ("lighting", TokenKind::Lighting),
    ("transitions", TokenKind::Transitions),
    ("motion", TokenKind::Motion),
    ("aging", TokenKind::Aging),
    ("morphing", TokenKind::Morphing),
    ("collision_detection", TokenKind::CollisionDetection),
    ("matrix", TokenKind::Matrix),
    ("optics", TokenKind::Optics),
    ("zoom", TokenKind::Zoom),
    ("voice", TokenKind::Voice),
    ("music", TokenKind::Music),
    ("cad", TokenKind::Cad),
    ("blueprinting", TokenKind::Blueprinting),
    ("world_building", TokenKind::WorldBuilding),
    ("encryption", TokenKind::Encryption),
    ("decryption", TokenKind::Decryption),
    ("conversions", TokenKind::Conversions),
    ("sectioning", TokenKind::Sectioning),
    ("warping", TokenKind::Warping),
    ("blurring", TokenKind::Blurring),
    ("sharpening", TokenKind::Sharpening),
    ("coordinates", TokenKind::Coordinates),
    ("reasoning", TokenKind::Reasoning),
];

/// Classify a lexeme: keyword kind if it appears in [`KEYWORDS`], otherwise
/// [`TokenKind::Ident`].
pub fn kind_of(lexeme: &str) -> TokenKind {
    for (text, kind) in KEYWORDS {
        if *text == lexeme {
            return *kind;
        }
    }
    TokenKind::Ident
}

/// Debug name of a kind, used by token dumps. The reverse of [`kind_of`] for
/// keyword kinds.
pub fn name_of(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Ident => "IDENT",
        TokenKind::Number => "NUMBER",
        TokenKind::Str => "STRING",
        TokenKind::Unknown => "UNKNOWN",
        TokenKind::Eof => "EOF",
        TokenKind::Assign => "ASSIGN",
        TokenKind::Semi => "SEMI",
        TokenKind::LParen => "LPAREN",
        TokenKind::RParen => "RPAREN",
        TokenKind::LBrace => "LBRACE",
        TokenKind::RBrace => "RBRACE",
        TokenKind::Comma => "COMMA",
        TokenKind::Colon => "COLON",
        TokenKind::Dot => "DOT",
        TokenKind::Define => "DEFINE",
        TokenKind::Func => "FUNC",
        TokenKind::Print => "PRINT",
        TokenKind::Class => "CLASS",
        TokenKind::Extends => "EXTENDS",
        TokenKind::Public => "PUBLIC",
        TokenKind::Private => "PRIVATE",
        TokenKind::Protected => "PROTECTED",
        TokenKind::New => "NEW",
        TokenKind::Super => "SUPER",
        TokenKind::This => "THIS",
        TokenKind::Inherit => "INHERIT",
        TokenKind::Eval => "EVAL",
        TokenKind::Raytracing => "RAYTRACING",
        TokenKind::Vectorize => "VECTORIZE",
        TokenKind::Shading => "SHADING",
        TokenKind::Tracking => "TRACKING",
        TokenKind::Rendering => "RENDERING",
        TokenKind::Stacking => "STACKING",
        TokenKind::Layering => "LAYERING",
        TokenKind::ParticlePhysics => "PARTICLE_PHYSICS",
        TokenKind::Sculpting => "SCULPTING",
        TokenKind::Texturing => "TEXTURING",
        TokenKind::Rigging => "RIGGING",
        TokenKind::Smoke => "SMOKE",
        TokenKind::Streaming => "STREAMING",
        TokenKind::Lighting => "LIGHTING",
        TokenKind::Transitions => "TRANSITIONS",
        TokenKind::Motion => "MOTION",
        TokenKind::Aging => "AGING",
        TokenKind::Morphing => "MORPHING",
        TokenKind::CollisionDetection => "COLLISION_DETECTION",
        TokenKind::Matrix => "MATRIX",
        TokenKind::Optics => "OPTICS",
        TokenKind::Zoom => "ZOOM",
        TokenKind::Voice => "VOICE",
        TokenKind::Music => "MUSIC",
        TokenKind::Cad => "CAD",
        TokenKind::Blueprinting => "BLUEPRINTING",
        TokenKind::WorldBuilding => "WORLD_BUILDING",
        TokenKind::Encryption => "ENCRYPTION",
        TokenKind::Decryption => "DECRYPTION",
        TokenKind::Conversions => "CONVERSIONS",
        TokenKind::Sectioning => "SECTIONING",
        TokenKind::Warping => "WARPING",
        TokenKind::Blurring => "BLURRING",
        TokenKind::Sharpening => "SHARPENING",
        TokenKind::Coordinates => "COORDINATES",
        TokenKind::Reasoning => "REASONING",
    }
}

impl TokenKind {
    /// True for the feature-keyword block (raytracing, morphing, ...).
    /// The block is the contiguous tail of [`KEYWORDS`] starting at
    /// `raytracing`; membership is checked against the table so the two
    /// definitions cannot drift apart.
    pub fn is_feature(self) -> bool {
        KEYWORDS
            .iter()
            .skip_while(|(_, k)| *k != TokenKind::Raytracing)
            .any(|(_, k)| *k == self)
    }

    /// True for `public`, `private`, and `protected`.
    pub fn is_visibility(self) -> bool {
        matches!(
            self,
            TokenKind::Public | TokenKind::Private | TokenKind::Protected
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(name_of(*self))
    }
}

/// A lexed token: kind, original lexeme text, and source position
/// (0-indexed line and column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// Construct a token, truncating the lexeme to [`MAX_LEXEME_LEN`].
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        let mut text = text.into();
        if text.len() > MAX_LEXEME_LEN {
            let mut cut = MAX_LEXEME_LEN;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        Token {
            kind,
            text,
            line,
            column,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}
