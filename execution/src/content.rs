//! Built-in content tables.

/// A multiple-choice question.
pub struct Question {
    pub text: &'static str,
    pub choices: [&'static str; 4],
    pub correct: usize,
}

pub const TRIVIA: [Question; 10] = [
    Question {
        text: "What is the capital of France?",
        choices: ["London", "Berlin", "Paris", "Madrid"],
        correct: 2,
    },
    Question {
        text: "Which planet is known as the Red Planet?",
        choices: ["Venus", "Mars", "Jupiter", "Saturn"],
        correct: 1,
    },
    Question {
        text: "What is 15 x 8?",
        choices: ["100", "110", "120", "130"],
        correct: 2,
    },
    Question {
        text: "Who painted the Mona Lisa?",
        choices: ["Michelangelo", "Leonardo da Vinci", "Raphael", "Donatello"],
        correct: 1,
    },
    Question {
        text: "What is the largest ocean on Earth?",
        choices: ["Atlantic", "Indian", "Arctic", "Pacific"],
        correct: 3,
    },
    Question {
        text: "How many sides does a hexagon have?",
        choices: ["5", "6", "7", "8"],
        correct: 1,
    },
    Question {
        text: "What is the smallest prime number?",
        choices: ["0", "1", "2", "3"],
        correct: 2,
    },
    Question {
        text: "In what year did World War II end?",
        choices: ["1943", "1944", "1945", "1946"],
        correct: 2,
    },
    Question {
        text: "What is the chemical symbol for gold?",
        choices: ["Ag", "Au", "Gd", "Go"],
        correct: 1,
    },
    Question {
        text: "How many continents are there?",
        choices: ["5", "6", "7", "8"],
        correct: 2,
    },
];

pub const WORK_TRIVIA: [Question; 3] = [
    Question {
        text: "What does HTML stand for?",
        choices: [
            "HyperText Markup Language",
            "Hyperloop Machine Language",
            "Home Tool Markup Language",
            "Hyper Transfer Map Language",
        ],
        correct: 0,
    },
    Question {
        text: "Which symbol starts a JS single-line comment?",
        choices: ["//", "#", "/*", "<!--"],
        correct: 0,
    },
    Question {
        text: "What does 'console.log' do?",
        choices: [
            "Prints to console",
            "Logs out",
            "Saves file",
            "Starts a loop",
        ],
        correct: 0,
    },
];

pub const TYPING_WORDS: [&str; 7] = [
    "apple", "banana", "checkout", "receipt", "register", "customer", "change",
];

pub const FOODS: [&str; 5] = ["🍔", "🍕", "🍣", "🍩", "🍪"];

/// One quiz round: a clue and the title it points at.
pub struct QuizEntry {
    pub answer: &'static str,
    pub clue: &'static str,
}

/// Named quiz set. Rounds run in table order; decoys come from the same set.
pub struct QuizSet {
    pub name: &'static str,
    pub entries: &'static [QuizEntry],
}

pub const QUIZ_SETS: [QuizSet; 3] = [
    QuizSet {
        name: "set1",
        entries: &[
            QuizEntry {
                answer: "Naruto",
                clue: "A loud orphan with a fox sealed inside him wants to lead his village.",
            },
            QuizEntry {
                answer: "One Piece",
                clue: "A rubber-limbed captain sails the Grand Line for a legendary treasure.",
            },
            QuizEntry {
                answer: "Death Note",
                clue: "A student finds a notebook that kills anyone whose name is written in it.",
            },
            QuizEntry {
                answer: "Attack on Titan",
                clue: "Humanity hides behind three walls from giant man-eaters.",
            },
            QuizEntry {
                answer: "Fullmetal Alchemist",
                clue: "Two brothers pay a terrible price for trying to bring their mother back.",
            },
        ],
    },
    QuizSet {
        name: "set2",
        entries: &[
            QuizEntry {
                answer: "Spirited Away",
                clue: "A girl works in a bathhouse for spirits to free her parents, now pigs.",
            },
            QuizEntry {
                answer: "My Neighbor Totoro",
                clue: "Two sisters meet a giant forest spirit who rides a cat bus.",
            },
            QuizEntry {
                answer: "Princess Mononoke",
                clue: "A cursed prince is caught between an ironworks town and the forest gods.",
            },
            QuizEntry {
                answer: "Howl's Moving Castle",
                clue: "A hatter turned old woman takes refuge in a walking castle.",
            },
        ],
    },
    QuizSet {
        name: "set3",
        entries: &[
            QuizEntry {
                answer: "Cowboy Bebop",
                clue: "Bounty hunters drift through the solar system to a jazz soundtrack.",
            },
            QuizEntry {
                answer: "Neon Genesis Evangelion",
                clue: "A reluctant teenager pilots a giant bio-machine against Angels.",
            },
            QuizEntry {
                answer: "Sailor Moon",
                clue: "A clumsy schoolgirl transforms to fight evil in the name of the moon.",
            },
            QuizEntry {
                answer: "Dragon Ball",
                clue: "A monkey-tailed boy hunts for seven wish-granting orbs.",
            },
            QuizEntry {
                answer: "Pokemon",
                clue: "A ten-year-old sets out to catch them all with an electric mouse.",
            },
        ],
    },
];

/// Quiz set named `name`, compared case-insensitively.
pub fn quiz_set(name: &str) -> Option<&'static QuizSet> {
    let name = name.trim();
    QUIZ_SETS.iter().find(|set| set.name.eq_ignore_ascii_case(name))
}
