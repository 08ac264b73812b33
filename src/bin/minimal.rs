// Minimal smoke run of the core layer stack

use art_studio::{
    modules::{ConfigValue, ModuleFactory, ModuleSpec},
    studio::{ExportFormat, Studio},
    surface::RasterSurface,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎨 Testing Art Studio Core Functionality");

    // Test 1: Module Factory
    println!("\n1. Testing Module Factory...");
    let factory = ModuleFactory::with_seed(42);
    let available = factory.available_types();
    println!("   Available modules: {:?}", available);
    assert_eq!(available.len(), 17);

    // Test 2: Studio Creation
    println!("\n2. Testing Studio...");
    let surface = RasterSurface::new(400, 300)?;
    let mut studio = Studio::new(surface, factory)?;

    studio.add_module("noise")?;
    studio.add_module(ModuleSpec::from("circles").with("count", 8).with("fill", false))?;
    let star_id = studio.add_module(ModuleSpec::from("stars").with("randomize", true))?.id();
    studio.add_module("kaleidoscope")?;
    println!("   Layers: {:?}", studio.layers());

    // Test 3: Configuration
    println!("\n3. Testing Configuration...");
    if let Some(layer) = studio.get_module_mut(star_id) {
        layer.module_mut().update_config("points", ConfigValue::Integer(7))?;
        println!("   Star options: {:?}", layer.serialize().config);
    }
    studio.regenerate_module(star_id);

    // Test 4: Ticking
    println!("\n4. Testing Frame Loop...");
    studio.start();
    let ran = studio.advance(30);
    println!("   Ran {} ticks", ran);

    // Test 5: Export
    println!("\n5. Testing Export...");
    match std::fs::write("minimal_test_output.png", studio.export_image(ExportFormat::Png)?) {
        Ok(()) => println!("   📁 Output saved to: minimal_test_output.png"),
        Err(e) => println!("   ⚠️  Could not save file: {}", e),
    }

    let composition = studio.export_composition();
    println!("   Composition: {}", composition.to_json_pretty()?);

    println!("\n🎉 All checks passed! Art Studio core is working.");

    Ok(())
}
