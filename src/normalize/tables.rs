//! Fixed lookup tables for address normalization.
//!
//! Entries are written in their natural spelling; anything compared against
//! normalized text is normalized once at first use.

/// Russian letters mapped to their Ukrainian equivalent; `None` drops the letter.
/// `ї` folds into `і` so that Russian and Ukrainian spellings of the same
/// name (`Киев`/`Київ`) land closer together.
pub const TRANSLITERATION: &[(char, Option<char>)] = &[
    ('ы', Some('и')),
    ('э', Some('е')),
    ('ё', Some('е')),
    ('ъ', None),
    ('ї', Some('і')),
];

/// Apostrophe variants removed outright, so `Слов'янськ` stays a single word.
pub const APOSTROPHES: &[char] = &['\'', '’', 'ʼ', '`', '‘'];

/// Settlement type prefixes, longest first.
pub const CITY_PREFIXES: &[&str] = &[
    "селище міського типу",
    "смт.",
    "смт",
    "с-ще",
    "селище",
    "село",
    "місто",
    "сел.",
    "м.",
    "с.",
];

/// Street type prefixes, longest first.
pub const STREET_PREFIXES: &[&str] = &[
    "вулиця",
    "вул.",
    "вул",
    "провулок",
    "пров.",
    "бульвар",
    "бульв.",
    "бул.",
    "проспект",
    "просп.",
    "пр-т",
    "площа",
    "пл.",
    "набережна",
    "наб.",
    "узвіз",
    "шосе",
    "майдан",
];

/// Given-name initials that commonly abbreviate street dedications
pub const NAME_ABBREVIATIONS: &[(&str, &str)] = &[
    ("л", "лесі"),
    ("т", "тараса"),
    ("б", "богдана"),
    ("і", "івана"),
    ("г", "григорія"),
    ("м", "михайла"),
    ("о", "олександра"),
];

/// Settlements renamed under decommunization and later acts, old → current.
pub const CITY_RENAMES: &[(&str, &str)] = &[
    ("Дніпропетровськ", "Дніпро"),
    ("Кіровоград", "Кропивницький"),
    ("Артемівськ", "Бахмут"),
    ("Дзержинськ", "Торецьк"),
    ("Красноармійськ", "Покровськ"),
    ("Іллічівськ", "Чорноморськ"),
    ("Комсомольськ", "Горішні Плавні"),
    ("Димитров", "Мирноград"),
    ("Котовськ", "Подільськ"),
    ("Орджонікідзе", "Покров"),
    ("Щорс", "Сновськ"),
    ("Червоноармійськ", "Радивилів"),
    ("Переяслав-Хмельницький", "Переяслав"),
    ("Новоград-Волинський", "Звягель"),
    ("Червоноград", "Шептицький"),
    ("Южне", "Південне"),
];

/// Large cities recognised without a settlement prefix when they lead a
/// comma-separated street field.
pub const MAJOR_CITIES: &[&str] = &[
    "Київ",
    "Харків",
    "Одеса",
    "Дніпро",
    "Львів",
    "Запоріжжя",
    "Кривий Ріг",
    "Миколаїв",
    "Вінниця",
    "Херсон",
    "Полтава",
    "Чернігів",
    "Черкаси",
    "Суми",
    "Житомир",
    "Хмельницький",
    "Рівне",
    "Луцьк",
    "Тернопіль",
    "Івано-Франківськ",
    "Ужгород",
    "Кропивницький",
    "Чернівці",
];

/// Vowels dropped by consonant extraction (post-normalization alphabet plus
/// the Russian letters that normalization folds away).
pub const VOWELS: &[char] = &[
    'а', 'е', 'и', 'і', 'о', 'у', 'ю', 'я', 'є', 'ї', 'ё', 'э', 'ы',
];
