//! The `lexiscreen profile` command.

use anyhow::Result;

use super::Paths;

/// Fields given on the command line; `None` leaves the stored value alone.
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub email: Option<String>,
    pub school: Option<String>,
    pub grade: Option<String>,
}

impl ProfileUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.email.is_none()
            && self.school.is_none()
            && self.grade.is_none()
    }
}

pub fn execute(paths: &Paths, update: ProfileUpdate) -> Result<()> {
    let (_, mut store) = paths.open()?;
    let mut profile = store.load_profile()?.unwrap_or_default();

    if !update.is_empty() {
        if let Some(name) = update.name {
            profile.name = name;
        }
        if update.age.is_some() {
            profile.age = update.age;
        }
        if update.email.is_some() {
            profile.email = update.email;
        }
        if update.school.is_some() {
            profile.school = update.school;
        }
        if update.grade.is_some() {
            profile.grade = update.grade;
        }
        store.save_profile(&profile)?;
        println!("Profile saved");
    }

    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}
