// Walks the whole seller/buyer flow once: setup, seal a sample document, prove,
// verify, and write keys and proof to disk.

use rand::rngs::OsRng;
use zkcp::document::random_key;
use zkcp::utils::{save_proof, save_proving_key, save_verifying_key};
use zkcp::{CircuitConfig, Contingent, Document};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CircuitConfig::new(4)?;
    let engine = Contingent::setup(config)?;

    save_proving_key(engine.proving_key()?, "../keys/contingent.pk.bin")?;
    save_verifying_key(engine.verifying_key(), "../keys/contingent.vk.bin")?;

    // Seller side
    let document = Document::from_bytes(b"the goods, delivered on payment", &config)?;
    let sealed = document.seal(random_key(&mut OsRng));
    let public = sealed.public_inputs();
    let proof = engine.prove(&public, &sealed.witness())?;
    save_proof(&proof, "../proofs/proof.json")?;

    // Buyer side
    let valid = engine.verify(&proof, &public)?;
    println!("Proof is valid: {}", valid);
    println!("Key hash: {}", hex::encode(sealed.key_hash));
    Ok(())
}
