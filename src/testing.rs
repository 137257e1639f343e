//! Shared fixture for unit tests: a small Gotham loaded through the real
//! importer into an in-memory store.

use crate::import::{SeedDocument, import_document};
use crate::store::Store;

pub const FIXTURE: &str = r#"{
  "characters": [
    {"name": "Batman",
     "description": "Batman is the secret identity of Bruce Wayne, a billionaire who protects Gotham City. He carries a utility belt full of gadgets.",
     "aliases": ["Bruce Wayne", "The Dark Knight"],
     "powers": ["Genius-level intellect", "Master martial artist", "Detective skills"]},
    {"name": "Joker",
     "description": "The Joker is a criminal mastermind, often armed with a joy buzzer and acid-squirting flower.",
     "aliases": ["Clown Prince of Crime"]},
    {"name": "Robin_(Dick_Grayson)", "description": "Dick Grayson was the first Robin, a former circus acrobat."},
    {"name": "Robin_(Jason_Todd)", "description": "Jason Todd was the second Robin."},
    {"name": "Robin_(Tim_Drake)", "description": "Tim Drake was the third Robin, a gifted detective."},
    {"name": "Robin_(Damian_Wayne)", "description": "Damian Wayne is the son of Bruce Wayne."},
    {"name": "Nightwing", "description": "Nightwing protects Bludhaven."},
    {"name": "Alfred_Pennyworth", "description": "Alfred Pennyworth is the loyal butler of the Wayne family."},
    {"name": "Commissioner_Gordon", "description": "James Gordon leads the Gotham City Police Department."},
    {"name": "Catwoman", "description": "Catwoman is a cat burglar.", "aliases": ["Selina Kyle"]},
    {"name": "Penguin", "description": "The Penguin is a crime boss.", "aliases": ["Oswald Cobblepot"]},
    {"name": "Bane", "description": "Bane is a masked mercenary of great strength."},
    {"name": "Two-Face", "description": "Two-Face was once district attorney.", "aliases": ["Harvey Dent"]},
    {"name": "Riddler", "description": "The Riddler leaves riddles at his crimes."},
    {"name": "Harley_Quinn", "description": "Harley Quinn was a psychiatrist at Arkham Asylum."},
    {"name": "Scarecrow", "description": "Scarecrow uses fear toxin.", "aliases": ["Jonathan Crane"]}
  ],
  "vehicles": [
    {"name": "Batmobile",
     "description": "The Batmobile is Batman's primary vehicle.",
     "specifications": {"max_speed": "200 mph", "armor": "Reinforced titanium plating",
                        "crew_capacity": "2", "length": "6 m"},
     "weapons": ["Machine guns", "Grappling hooks", "Missiles"],
     "defensive_systems": ["Smoke screen", "Oil slick"],
     "special_features": ["Ejector seat"],
     "users": ["Batman", "Robin_(Dick_Grayson)"]},
    {"name": "Batwing",
     "description": "The Batwing is Batman's jet aircraft.",
     "specifications": {"max_speed": "400 mph", "length": "12 m"},
     "weapons": ["Air-to-air missiles"],
     "users": ["Batman"]},
    {"name": "Batcycle", "description": "A motorcycle used by Batman.", "users": ["Batman"]},
    {"name": "Batboat", "description": "A boat.", "specifications": {"max_speed": "80 mph"}},
    {"name": "Jokermobile", "description": "The Joker's car.", "users": ["Joker"]},
    {"name": "Penguin_Submarine", "description": "A submarine shaped like a penguin.", "users": ["Penguin"]}
  ],
  "locations": [
    {"name": "Wayne_Manor", "description": "Wayne Manor is the home of Bruce Wayne.",
     "characters": [{"name": "Batman", "association": "residence"},
                    {"name": "Alfred_Pennyworth", "association": "residence"}]},
    {"name": "Batcave", "description": "The Batcave lies beneath Wayne Manor.",
     "characters": [{"name": "Batman", "association": "base"}]},
    {"name": "Gotham_City", "description": "Gotham City is a crime-ridden city.",
     "characters": [{"name": "Batman", "association": "protects"},
                    {"name": "Joker", "association": "operates"}]},
    {"name": "Arkham_Asylum", "description": "Arkham Asylum houses the criminally insane.",
     "characters": [{"name": "Joker", "association": "inmate"}]}
  ],
  "storylines": [
    {"name": "The_Killing_Joke", "description": "A one-shot story about the Joker."}
  ],
  "organizations": [
    {"name": "League_of_Assassins", "description": "An ancient order of killers."}
  ],
  "relationships": [
    {"character": "Batman", "related": "Joker", "type": "enemy"},
    {"character": "Batman", "related": "Bane", "type": "enemy"},
    {"character": "Batman", "related": "Alfred_Pennyworth", "type": "family"},
    {"character": "Batman", "related": "Robin_(Damian_Wayne)", "type": "family"},
    {"character": "Joker", "related": "Harley_Quinn", "type": "ally"}
  ]
}"#;

pub fn fixture_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    let doc: SeedDocument = serde_json::from_str(FIXTURE).unwrap();
    import_document(&store, &doc, "fixture.json").unwrap();
    store
}
