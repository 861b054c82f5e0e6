use mocksmith_generate::GeneratorRegistry;

fn main() {
    let registry = GeneratorRegistry::new();
    for generator in registry.generators() {
        println!("{:<20} {}", generator.id(), generator.module());
    }
}
