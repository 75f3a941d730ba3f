use lure_core::persona::catalogue;

pub fn list(profile: bool) {
    for persona in catalogue() {
        let facts = persona.facts();
        if profile {
            println!("== {} ({}) ==", facts.name, persona.template());
            println!("{}", persona.render_profile());
            println!();
        } else {
            println!(
                "{:<22} {:<20} {:>3}  {:<10} {}",
                persona.template().to_string(),
                facts.name,
                facts.age,
                persona.policy().tech_savviness.to_string(),
                facts.location
            );
        }
    }
}
