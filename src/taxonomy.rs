// 🌳 Seed Taxonomy - Canonical physician specialties
//
// Structure:
// - Primary Care
// - Hospital-Based
// - Medical Specialties
// - Surgical Specialties
// - Women's Health
// - Behavioral Health
// - Pediatric Subspecialties
//
// Every predefined synonym is unique across the whole taxonomy under
// normalized comparison (checked by test_seed_synonyms_are_globally_unique).

use crate::entities::{CanonicalSpecialty, SpecialtySource};

pub const PRIMARY_CARE: &str = "Primary Care";
pub const HOSPITAL_BASED: &str = "Hospital-Based";
pub const MEDICAL: &str = "Medical Specialties";
pub const SURGICAL: &str = "Surgical Specialties";
pub const WOMENS_HEALTH: &str = "Women's Health";
pub const BEHAVIORAL_HEALTH: &str = "Behavioral Health";
pub const PEDIATRIC_SUBSPECIALTIES: &str = "Pediatric Subspecialties";

type SeedEntry = (&'static str, &'static str, &'static [&'static str]);

const SEED: &[SeedEntry] = &[
    // Primary Care
    ("Family Medicine", PRIMARY_CARE, &["Family Practice", "Family Medicine (General)", "Family Medicine without OB", "FM"]),
    ("Internal Medicine", PRIMARY_CARE, &["General Internal Medicine", "Internal Medicine - General", "IM"]),
    ("Pediatrics", PRIMARY_CARE, &["General Pediatrics", "Pediatrics - General", "Pediatric Medicine"]),
    ("Urgent Care", PRIMARY_CARE, &["Urgent Care Medicine"]),
    // Hospital-Based
    ("Hospitalist", HOSPITAL_BASED, &["Hospital Medicine", "Internal Medicine: Hospitalist", "Hospitalist - Internal Medicine"]),
    ("Emergency Medicine", HOSPITAL_BASED, &["Emergency Room", "ER Physician", "Emergency Medicine (General)"]),
    ("Anesthesiology", HOSPITAL_BASED, &["Anesthesia", "Anesthesiology - General"]),
    ("Radiology", HOSPITAL_BASED, &["Diagnostic Radiology", "Radiology: Diagnostic", "Radiology - General"]),
    ("Pathology", HOSPITAL_BASED, &["Anatomic & Clinical Pathology", "Pathology (General)"]),
    // Medical Specialties
    ("Cardiology", MEDICAL, &["Cardiovascular Disease", "Cardiology (General)", "Cardiology: Noninvasive", "Noninvasive Cardiology"]),
    ("Interventional Cardiology", MEDICAL, &["Cardiology: Interventional", "Invasive-Interventional Cardiology"]),
    ("Gastroenterology", MEDICAL, &["GI", "Gastroenterology (General)"]),
    ("Pulmonology", MEDICAL, &["Pulmonary Disease", "Pulmonary Medicine", "Pulmonary/Critical Care"]),
    ("Nephrology", MEDICAL, &["Kidney Disease"]),
    ("Endocrinology", MEDICAL, &["Endocrinology/Diabetes/Metabolism", "Endocrinology & Metabolism"]),
    ("Hematology/Oncology", MEDICAL, &["Hem/Onc", "Hematology & Medical Oncology", "Oncology/Hematology"]),
    ("Neurology", MEDICAL, &["Neurology (General)", "General Neurology"]),
    ("Dermatology", MEDICAL, &["Dermatology (General)", "General Dermatology"]),
    ("Rheumatology", MEDICAL, &["Rheumatology (General)"]),
    ("Infectious Disease", MEDICAL, &["Infectious Diseases", "ID"]),
    // Surgical Specialties
    ("General Surgery", SURGICAL, &["Surgery: General", "Surgery"]),
    ("Orthopedic Surgery", SURGICAL, &["Orthopaedic Surgery", "Orthopedics", "Orthopedic Surgery (General)"]),
    ("Neurosurgery", SURGICAL, &["Neurological Surgery"]),
    ("Urology", SURGICAL, &["Urology (General)"]),
    ("Otolaryngology", SURGICAL, &["ENT", "Otorhinolaryngology"]),
    ("Ophthalmology", SURGICAL, &["Ophthalmology (General)"]),
    ("Vascular Surgery", SURGICAL, &["Surgery: Vascular"]),
    ("Cardiothoracic Surgery", SURGICAL, &["Cardiovascular & Thoracic Surgery", "Thoracic Surgery"]),
    // Women's Health
    ("Obstetrics & Gynecology", WOMENS_HEALTH, &["OB/GYN", "OBGYN", "Obstetrics/Gynecology (General)"]),
    ("Gynecologic Oncology", WOMENS_HEALTH, &["Oncology: Gynecologic"]),
    ("Maternal Fetal Medicine", WOMENS_HEALTH, &["Perinatology"]),
    // Behavioral Health
    ("Psychiatry", BEHAVIORAL_HEALTH, &["General Psychiatry", "Psychiatry (General)", "Adult Psychiatry"]),
    ("Child Psychiatry", BEHAVIORAL_HEALTH, &["Child & Adolescent Psychiatry"]),
    // Pediatric Subspecialties
    ("Neonatology", PEDIATRIC_SUBSPECIALTIES, &["Neonatal-Perinatal Medicine", "Pediatrics: Neonatology"]),
    ("Pediatric Cardiology", PEDIATRIC_SUBSPECIALTIES, &["Cardiology: Pediatric", "Pediatrics - Cardiology"]),
    ("Pediatric Emergency Medicine", PEDIATRIC_SUBSPECIALTIES, &["Emergency Medicine: Pediatric"]),
];

/// Build the predefined canonical specialties
pub fn seed_specialties() -> Vec<CanonicalSpecialty> {
    SEED.iter()
        .map(|(name, category, synonyms)| {
            let mut specialty = CanonicalSpecialty::new(name, category, SpecialtySource::Predefined);
            specialty
                .synonyms
                .predefined
                .extend(synonyms.iter().map(|s| s.to_string()));
            specialty
        })
        .collect()
}
