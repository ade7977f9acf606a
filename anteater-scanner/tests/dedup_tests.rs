// Tests for near-duplicate detection over real page text

use anteater_scanner::{DedupOutcome, DuplicateIndex, Fingerprint};

const DEPARTMENT: &str = "The Donald Bren School of Information and Computer Sciences is home to research groups working on
machine learning, databases, software engineering, networked systems and the theory of computation.
Faculty members supervise doctoral students and teach undergraduate courses every quarter. The school
hosts seminars on Fridays where visiting researchers present recent results to students and staff.
Prospective students can find admission requirements, deadlines and financial aid information on the
graduate program pages. Course listings are updated before each quarter begins and include the
instructor, meeting times, prerequisites and a short description of the topics that will be covered.
Research labs publish technical reports, datasets and software artifacts that accompany their papers.
The department also maintains computing facilities, including clusters for large scale experiments,
and provides support for students who need access to specialized hardware for their projects.";

const STATISTICS: &str = "Statistics majors learn probability, inference and regression with a strong emphasis on applied data
analysis. Laboratory sessions use the R language to explore real datasets drawn from public health,
economics and environmental monitoring. Students complete a capstone consulting project in their final
year where they advise campus clients on experimental design and modeling choices. Advising appointments
may be scheduled online, and peer tutors are available in the learning center throughout the term.
Alumni of the program work as analysts, actuaries and data scientists at hospitals, banks and technology
companies across the region, and many continue to graduate study in biostatistics or epidemiology.";

const CAMPUS: &str = "Parking permits for visitors are sold at kiosks near each structure, and daily rates change during
special events held at the arena. Shuttle routes connect the residential villages with the central
plaza every fifteen minutes on weekdays, while weekend service runs on a reduced schedule. Bicycle
racks and repair stations are located outside most lecture halls, and the campus police department
offers free registration to help recover stolen bikes. Dining halls serve breakfast, lunch and dinner
with vegetarian options at every meal, and the farmers market sets up on the green each Thursday.";

fn long_page() -> String {
    format!("{}\n{}", DEPARTMENT, STATISTICS)
}

fn long_page_with_extra_sentence() -> String {
    long_page().replace(
        "every quarter.",
        "every quarter. Office hours are posted on the course website each week.",
    )
}

#[test]
fn test_identical_pages_are_duplicates() {
    let mut index = DuplicateIndex::new();
    let first = Fingerprint::compute(DEPARTMENT);
    let second = Fingerprint::compute(DEPARTMENT);

    assert_eq!(first, second);
    assert_eq!(index.check_and_insert(first), DedupOutcome::Unique);
    assert!(index.is_near_duplicate(second));
}

#[test]
fn test_inserted_sentence_is_near_duplicate() {
    let original = Fingerprint::compute(&long_page());
    let edited = Fingerprint::compute(&long_page_with_extra_sentence());

    let mut index = DuplicateIndex::new();
    index.insert(original);

    assert!(
        index.is_near_duplicate(edited),
        "distance {} exceeds tolerance {}",
        original.hamming_distance(&edited),
        index.max_distance()
    );
}

#[test]
fn test_unrelated_pages_are_not_duplicates() {
    let mut index = DuplicateIndex::new();
    index.insert(Fingerprint::compute(DEPARTMENT));

    let campus = Fingerprint::compute(CAMPUS);
    assert!(!index.is_near_duplicate(campus));
    assert_eq!(index.check_and_insert(campus), DedupOutcome::Unique);
    assert_eq!(index.len(), 2);
}

#[test]
fn test_unrelated_distance_is_large() {
    let a = Fingerprint::compute(STATISTICS);
    let b = Fingerprint::compute(CAMPUS);
    assert!(a.hamming_distance(&b) > 7);
}
